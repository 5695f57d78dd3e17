//! A small tag dialect layered over the plain text rules.
//!
//! | markup | token |
//! |---|---|
//! | `<i>` `</i>` `<b>` `</b>` `<h>` `</h>` | `StyleChange` with the matching style flag |
//! | `<left>` `<right>` `<center>` `<justify>` | `StyleChange` with the matching alignment |
//! | `<br>` | `NewParagraph` |
//! | `<hr>` | `Ruler` |
//! | `<sep>` | `Separator` |
//! | `<img src="...">caption</img>` | `Image` |
//! | any other tag, `<!-- ... -->` | `Pass` |
//!
//! Tag names are ASCII case-insensitive and `<x/>` is the same as `<x>`. A
//! `<` that does not open a well-formed tag is ordinary text.

use memchr::{memchr, memmem};

use super::plain::{PlainTextParser, line_break};
use super::{Alignment, Span, StyleFlags, TextParser, Token, TokenKind, is_control};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser {
    plain: PlainTextParser,
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextParser for MarkupParser {
    fn parse(&mut self, text: &str, position: usize) -> Token {
        let bytes = text.as_bytes();
        let rest = &bytes[position..];

        if rest[0] == b'<' {
            if let Some(token) = parse_tag(bytes, position) {
                return token;
            }
            let len = 1 + text_run(&rest[1..]);
            return Token::new(TokenKind::Normal, position, len);
        }

        if is_control(rest[0]) || line_break(rest).is_some() {
            return self.plain.parse(text, position);
        }

        Token::new(TokenKind::Normal, position, text_run(rest))
    }
}

fn text_run(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b == b'<' || is_control(b))
        .unwrap_or(bytes.len())
}

/// Recognizes the tag starting at `start`, or `None` if the `<` there does
/// not open one.
fn parse_tag(bytes: &[u8], start: usize) -> Option<Token> {
    let rest = &bytes[start..];

    if rest.starts_with(b"<!--") {
        let end = memmem::find(&rest[4..], b"-->")?;
        return Some(Token::new(TokenKind::Pass, start, 4 + end + 3));
    }

    let close = memchr(b'>', rest)?;
    let inner = &rest[1..close];
    if memchr(b'<', inner).is_some() {
        return None;
    }
    let len = close + 1;

    if matches!(inner.first(), Some(b'!') | Some(b'?')) {
        return Some(Token::new(TokenKind::Pass, start, len));
    }

    let (closing, inner) = match inner.strip_prefix(b"/") {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let (self_closing, inner) = match inner.strip_suffix(b"/") {
        Some(inner) => (true, inner),
        None => (false, inner),
    };

    let name_len = inner
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let name = &inner[..name_len];
    if !name.first().is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }

    let style = |enable: StyleFlags, disable: StyleFlags| {
        let flag = if closing { disable } else { enable };
        Token::new(TokenKind::StyleChange, start, len).with_style(flag)
    };
    let align = |flag: Alignment| Token::new(TokenKind::StyleChange, start, len).with_align(flag);

    let is = |tag: &[u8]| name.eq_ignore_ascii_case(tag);

    let token = if is(b"i") {
        style(StyleFlags::ENABLE_ITALIC, StyleFlags::DISABLE_ITALIC)
    } else if is(b"b") {
        style(StyleFlags::ENABLE_BOLD, StyleFlags::DISABLE_BOLD)
    } else if is(b"h") {
        style(StyleFlags::ENABLE_HEADING, StyleFlags::DISABLE_HEADING)
    } else if closing {
        Token::new(TokenKind::Pass, start, len)
    } else if is(b"left") {
        align(Alignment::LEFT)
    } else if is(b"right") {
        align(Alignment::RIGHT)
    } else if is(b"center") {
        align(Alignment::CENTER)
    } else if is(b"justify") {
        align(Alignment::JUSTIFY)
    } else if is(b"br") {
        Token::new(TokenKind::NewParagraph, start, len)
    } else if is(b"hr") {
        Token::new(TokenKind::Ruler, start, len)
    } else if is(b"sep") {
        Token::new(TokenKind::Separator, start, len)
    } else if is(b"img") {
        let attrs_offset = start + 1 + name_len;
        let attrs = &inner[name_len..];
        match find_attr(attrs, b"src") {
            Some(source) => image(bytes, start, len, self_closing, source.shifted(attrs_offset)),
            None => Token::new(TokenKind::Pass, start, len),
        }
    } else {
        Token::new(TokenKind::Pass, start, len)
    };
    Some(token)
}

/// Builds an image token. Unless the tag closes itself, the caption runs up
/// to a matching `</img>`; without one the caption is empty.
fn image(bytes: &[u8], start: usize, tag_len: usize, self_closing: bool, source: Span) -> Token {
    let caption_start = start + tag_len;
    let mut len = tag_len;
    let mut caption = Span::new(caption_start, 0);

    if !self_closing {
        let after = &bytes[caption_start..];
        if let Some(end) = memmem::find_iter(after, b"</").find(|&i| is_img_close(&after[i..])) {
            caption = Span::new(caption_start, end);
            len = tag_len + end + b"</img>".len();
        }
    }

    Token::new(TokenKind::Image { source, caption }, start, len)
}

fn is_img_close(bytes: &[u8]) -> bool {
    bytes.len() >= 6 && bytes[2..5].eq_ignore_ascii_case(b"img") && bytes[5] == b'>'
}

/// Finds the value of attribute `name` in the attribute part of a tag.
/// Offsets are relative to `attrs`.
fn find_attr(attrs: &[u8], name: &[u8]) -> Option<Span> {
    let mut i = 0;
    while i < attrs.len() {
        while i < attrs.len() && attrs[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < attrs.len() && attrs[i] != b'=' && !attrs[i].is_ascii_whitespace() {
            i += 1;
        }
        let key = &attrs[key_start..i];

        while i < attrs.len() && attrs[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= attrs.len() || attrs[i] != b'=' {
            if key.is_empty() {
                i += 1;
            }
            continue;
        }
        i += 1;
        while i < attrs.len() && attrs[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match attrs.get(i) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = i + 1;
                let value_len = memchr(quote, &attrs[value_start..])
                    .unwrap_or(attrs.len() - value_start);
                i = value_start + value_len + 1;
                Span::new(value_start, value_len)
            }
            _ => {
                let value_start = i;
                while i < attrs.len() && !attrs[i].is_ascii_whitespace() {
                    i += 1;
                }
                Span::new(value_start, i - value_start)
            }
        };

        if key.eq_ignore_ascii_case(name) {
            return Some(value);
        }
    }
    None
}

impl Span {
    fn shifted(self, by: usize) -> Span {
        Span::new(self.offset + by, self.len)
    }
}
