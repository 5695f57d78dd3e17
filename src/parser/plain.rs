use super::{TextParser, Token, TokenKind, is_control};

/// Plain text: line breaks start paragraphs, other control characters are
/// skipped, everything else is text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl TextParser for PlainTextParser {
    fn parse(&mut self, text: &str, position: usize) -> Token {
        let rest = &text.as_bytes()[position..];

        if let Some(len) = line_break(rest) {
            return Token::new(TokenKind::NewParagraph, position, len);
        }

        if is_control(rest[0]) {
            let len = rest
                .iter()
                .enumerate()
                .position(|(i, &b)| !is_control(b) || line_break(&rest[i..]).is_some())
                .unwrap_or(rest.len());
            return Token::new(TokenKind::Pass, position, len);
        }

        let len = rest
            .iter()
            .position(|&b| is_control(b))
            .unwrap_or(rest.len());
        Token::new(TokenKind::Normal, position, len)
    }
}

/// Length of the line break at the start of `bytes`, if any.
pub(crate) fn line_break(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [b'\n', ..] => Some(1),
        [b'\r', b'\n', ..] => Some(2),
        _ => None,
    }
}
