use albite::parser::{Alignment, Span, StyleFlags};
use albite::{MarkupParser, PlainTextParser, TextParser, Token, TokenKind, Tokenizer};

const CHAPTER: &str = "<center><h>Chapter One</h>\n\
<justify>It was <i>the best</i> of times, it was the <b>worst</b> of times.<br>\
<img src=\"images/bastille.png\">The Bastille</img>\
<sep>Meanwhile <!-- editor note --> in London.<hr>";

fn collect<P: TextParser>(parser: P, text: &str) -> Vec<Token> {
    Tokenizer::new(parser).tokens(text).collect()
}

fn assert_partition(tokens: &[Token], len: usize) {
    let mut offset = 0;
    for token in tokens {
        assert_eq!(token.offset(), offset);
        offset = token.span.end();
    }
    assert_eq!(offset, len);
}

#[test]
fn test_markup_chapter_scan() {
    let tokens = collect(MarkupParser::new(), CHAPTER);
    assert_partition(&tokens, CHAPTER.len());

    let visible: String = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Normal)
        .map(|t| t.text(CHAPTER))
        .collect();
    assert_eq!(
        visible,
        "Chapter OneIt was the best of times, it was the worst of times.Meanwhile  in London."
    );

    let structure: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Normal && t.kind != TokenKind::StyleChange)
        .map(|t| match t.kind {
            TokenKind::Image { .. } => "image",
            TokenKind::NewParagraph => "paragraph",
            TokenKind::Separator => "separator",
            TokenKind::Ruler => "ruler",
            TokenKind::Pass => "pass",
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        structure,
        vec!["paragraph", "paragraph", "image", "separator", "pass", "ruler"]
    );

    let image = tokens
        .iter()
        .find_map(|t| match t.kind {
            TokenKind::Image { source, caption } => Some((source, caption)),
            _ => None,
        })
        .unwrap();
    assert_eq!(image.0.slice(CHAPTER), "images/bastille.png");
    assert_eq!(image.1.slice(CHAPTER), "The Bastille");

    let aligns: Vec<_> = tokens
        .iter()
        .filter(|t| !t.align.is_empty())
        .map(|t| t.align)
        .collect();
    assert_eq!(aligns, vec![Alignment::CENTER, Alignment::JUSTIFY]);

    let styles: Vec<_> = tokens
        .iter()
        .filter(|t| !t.style.is_empty())
        .map(|t| t.style)
        .collect();
    assert_eq!(
        styles,
        vec![
            StyleFlags::ENABLE_HEADING,
            StyleFlags::DISABLE_HEADING,
            StyleFlags::ENABLE_ITALIC,
            StyleFlags::DISABLE_ITALIC,
            StyleFlags::ENABLE_BOLD,
            StyleFlags::DISABLE_BOLD,
        ]
    );
}

#[test]
fn test_plain_parser_keeps_markup_as_text() {
    let tokens = collect(PlainTextParser, CHAPTER);
    assert_partition(&tokens, CHAPTER.len());
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].kind, TokenKind::NewParagraph);
}

#[test]
fn test_restart_from_saved_position() {
    let mut tokenizer = Tokenizer::new(MarkupParser::new());
    let tokens: Vec<_> = tokenizer.tokens(CHAPTER).collect();
    let resume = tokens[5];

    tokenizer.reset_to(resume.offset());
    let resumed: Vec<_> = tokenizer.tokens(CHAPTER).collect();
    assert_eq!(resumed.as_slice(), &tokens[5..]);
}

#[test]
fn test_tokenizer_is_reusable_across_chapters() {
    let mut tokenizer = Tokenizer::new(PlainTextParser);
    assert_eq!(tokenizer.tokens("first\nchapter").count(), 3);

    tokenizer.reset();
    let token = *tokenizer.parse_next("second").unwrap();
    assert_eq!(token.span, Span::new(0, 6));
    assert_eq!(token.kind, TokenKind::Normal);
    assert!(tokenizer.parse_next("second").is_none());
}
