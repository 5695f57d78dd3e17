//! Chapter text tokenizers.
//!
//! A [`TextParser`] recognizes one token at a given offset. The [`Tokenizer`]
//! harness drives a parser across a buffer, keeping the cursor and the last
//! token, so that successive tokens partition the buffer without gaps or
//! overlap.

pub mod markup;
pub mod plain;

pub use markup::MarkupParser;
pub use plain::PlainTextParser;

use bitflags::bitflags;

/// A byte range inside the tokenized buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The covered text, or `""` if the span does not fit `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.offset..self.end()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Content that is consumed but not rendered.
    Pass,
    #[default]
    Normal,
    NewParagraph,
    /// Only the style or alignment flags carry information.
    StyleChange,
    Image {
        source: Span,
        caption: Span,
    },
    /// Full-width horizontal divider.
    Ruler,
    /// Short divider.
    Separator,
}

bitflags! {
    /// Style toggles carried by a token. A `DISABLE_*` flag reverts a style
    /// enabled earlier; it is not the same as the `ENABLE_*` flag being unset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StyleFlags: u8 {
        const ENABLE_ITALIC = 0x01;
        const DISABLE_ITALIC = 0x02;
        const ENABLE_BOLD = 0x04;
        const DISABLE_BOLD = 0x08;
        const ENABLE_HEADING = 0x10;
        const DISABLE_HEADING = 0x20;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Alignment: u8 {
        const LEFT = 0x01;
        const RIGHT = 0x02;
        const CENTER = 0x04;
        const JUSTIFY = 0x08;
    }
}

/// One classified unit of tokenizer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    pub style: StyleFlags,
    pub align: Alignment,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize, len: usize) -> Self {
        Self {
            span: Span::new(offset, len),
            kind,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: StyleFlags) -> Self {
        self.style = style;
        self
    }

    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn offset(&self) -> usize {
        self.span.offset
    }

    pub fn len(&self) -> usize {
        self.span.len
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        self.span.slice(text)
    }
}

/// A tokenizer dialect.
pub trait TextParser {
    /// Recognizes the token starting at `position`. `position` is always a
    /// character boundary strictly inside `text`.
    fn parse(&mut self, text: &str, position: usize) -> Token;

    /// Clears any state the dialect keeps between tokens.
    fn reset(&mut self) {}
}

/// Reusable cursor driving a [`TextParser`] over a buffer.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer<P> {
    parser: P,
    position: usize,
    token: Token,
}

impl<P: TextParser> Tokenizer<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            position: 0,
            token: Token::default(),
        }
    }

    /// Moves back to offset 0 and clears the last token.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.position = 0;
        self.token = Token::default();
    }

    /// Like [`Tokenizer::reset`], but the next token starts at `position`.
    pub fn reset_to(&mut self, position: usize) {
        self.reset();
        self.position = position;
        self.token.span.offset = position;
    }

    /// Where the next token starts.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The last token produced, or the zeroed token after a reset.
    pub fn current(&self) -> &Token {
        &self.token
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Recognizes the next token of `text`, or returns `None` at the end.
    ///
    /// The token is forced to start at the cursor, to be at least one byte
    /// long and to end on a character boundary inside `text`.
    pub fn parse_next(&mut self, text: &str) -> Option<&Token> {
        let position = floor_char_boundary(text, self.position);
        if position >= text.len() {
            self.position = position;
            return None;
        }

        let mut token = self.parser.parse(text, position);
        let remaining = text.len() - position;
        let mut len = token.span.len.clamp(1, remaining);
        while !text.is_char_boundary(position + len) {
            len += 1;
        }
        token.span = Span::new(position, len);

        self.position = position + len;
        self.token = token;
        Some(&self.token)
    }

    /// Iterates over the remaining tokens of `text`.
    pub fn tokens<'t>(&'t mut self, text: &'t str) -> Tokens<'t, P> {
        Tokens {
            tokenizer: self,
            text,
        }
    }
}

pub struct Tokens<'t, P> {
    tokenizer: &'t mut Tokenizer<P>,
    text: &'t str,
}

impl<P: TextParser> Iterator for Tokens<'_, P> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.tokenizer.parse_next(self.text).copied()
    }
}

fn floor_char_boundary(text: &str, position: usize) -> usize {
    if position >= text.len() {
        return text.len();
    }
    let mut position = position;
    while !text.is_char_boundary(position) {
        position -= 1;
    }
    position
}

/// ASCII control characters other than tab.
pub(crate) fn is_control(byte: u8) -> bool {
    (byte < 0x20 && byte != b'\t') || byte == 0x7f
}
