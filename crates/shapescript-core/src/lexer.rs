// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Source text → token stream.

use crate::error::{LexError, LexErrorKind};
use crate::source::SourceRange;
use crate::token::{Adjacency, Keyword, Operator, Punctuation, Token, TokenKind};

/// Lexes `source` into a token stream. Lexing never stops at the first
/// error — like the analyzer, it keeps going so a caller can report every
/// problem at once — but only the *first* error is returned, as a single
/// optional error rather than a list.
#[must_use]
pub fn lex(source: &str) -> (Vec<Token>, Option<LexError>) {
    let source = strip_bom(source);
    let mut lexer = Lexer { source, bytes: source.as_bytes(), pos: 0, first_error: None };
    let tokens = lexer.run();
    (tokens, lexer.first_error)
}

fn strip_bom(source: &str) -> &str {
    source.strip_prefix('\u{feff}').unwrap_or(source)
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    first_error: Option<LexError>,
}

impl<'s> Lexer<'s> {
    fn run(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let had_whitespace_before = self.skip_whitespace_and_comments();
            let start = self.pos;
            let Some(ch) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, range: SourceRange::empty_at(start) });
                break;
            };
            let kind = match ch {
                '\n' => {
                    self.bump_newline();
                    TokenKind::LineBreak
                }
                '\r' => {
                    self.bump_newline();
                    TokenKind::LineBreak
                }
                '"' => self.lex_string(),
                '#' => self.lex_hex_color(),
                '0'..='9' => self.lex_number(),
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
                c if is_ident_start(c) => self.lex_identifier(),
                '(' => self.single(Punctuation::LParen),
                ')' => self.single(Punctuation::RParen),
                '{' => self.single(Punctuation::LBrace),
                '}' => self.single(Punctuation::RBrace),
                '[' => self.single(Punctuation::LBracket),
                ']' => self.single(Punctuation::RBracket),
                ',' => self.single(Punctuation::Comma),
                '.' => self.single(Punctuation::Dot),
                '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' => {
                    self.lex_operator(had_whitespace_before)
                }
                other => {
                    self.advance_char();
                    self.report(LexErrorKind::InvalidCharacter(other), start);
                    continue;
                }
            };
            let range = SourceRange::new(start, self.pos);
            tokens.push(Token { kind, range });
        }
        tokens
    }

    fn report(&mut self, kind: LexErrorKind, start: usize) {
        if self.first_error.is_none() {
            self.first_error = Some(LexError::new(kind, SourceRange::new(start, self.pos)));
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, chars_ahead: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(chars_ahead)
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn single(&mut self, p: Punctuation) -> TokenKind {
        self.advance_char();
        TokenKind::Punctuation(p)
    }

    /// Consumes a line break, collapsing `\r\n` into a single token.
    fn bump_newline(&mut self) {
        if self.peek() == Some('\r') {
            self.advance_char();
            if self.peek() == Some('\n') {
                self.advance_char();
            }
        } else {
            self.advance_char();
        }
    }

    /// Skips whitespace (other than line breaks, which are tokens) and
    /// comments. Returns whether anything was skipped, for sign-adjacency
    /// tracking.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() && c != '\n' && c != '\r' => {
                    self.advance_char();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                        self.advance_char();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance_char();
                    self.advance_char();
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.advance_char();
                    }
                    self.advance_char();
                    self.advance_char();
                }
                _ => break,
            }
        }
        self.pos != start
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.advance_char();
        }
        let word = &self.source[start..self.pos];
        match Keyword::lookup(word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(word.to_string()),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            // Consume a fractional part; a bare trailing '.' with no
            // digits following still forms a valid integer token
            // followed by a separate '.' operator.
            self.advance_char();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_char();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mark = self.pos;
            self.advance_char();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance_char();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance_char();
                }
            } else {
                // Not actually an exponent; back out.
                self.pos = mark;
            }
        }
        let text = &self.source[start..self.pos];
        match text.parse::<f64>() {
            Ok(value) => TokenKind::Number(value),
            Err(_) => {
                self.report(LexErrorKind::InvalidNumber, start);
                TokenKind::Number(0.0)
            }
        }
    }

    fn lex_string(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance_char(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    self.report(LexErrorKind::UnterminatedString, start);
                    break;
                }
                Some('"') => {
                    self.advance_char();
                    break;
                }
                Some('\\') => {
                    self.advance_char();
                    match self.peek() {
                        Some('n') => {
                            value.push('\n');
                            self.advance_char();
                        }
                        Some('"') => {
                            value.push('"');
                            self.advance_char();
                        }
                        Some('\\') => {
                            value.push('\\');
                            self.advance_char();
                        }
                        Some(other) => {
                            let escape_start = self.pos;
                            self.advance_char();
                            self.report(LexErrorKind::InvalidEscapeSequence(other), escape_start);
                        }
                        None => {
                            self.report(LexErrorKind::UnterminatedString, start);
                            break;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance_char();
                }
            }
        }
        TokenKind::String(value)
    }

    fn lex_hex_color(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance_char(); // '#'
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance_char();
        }
        let digits = &self.source[digits_start..self.pos];
        match expand_hex_digits(digits) {
            Some(rgba) => TokenKind::HexColor(rgba),
            None => {
                self.report(LexErrorKind::InvalidNumber, start);
                TokenKind::HexColor([0, 0, 0, 255])
            }
        }
    }

    fn lex_operator(&mut self, had_whitespace_before: bool) -> TokenKind {
        let start = self.pos;
        let ch = self.advance_char().unwrap_or_default();
        let (op, len) = match ch {
            '+' => (Operator::Plus, 1),
            '-' => (Operator::Minus, 1),
            '*' => (Operator::Star, 1),
            '/' => (Operator::Slash, 1),
            '%' => (Operator::Percent, 1),
            '=' => (Operator::Equals, 1),
            '<' if self.peek() == Some('>') => {
                self.advance_char();
                (Operator::NotEquals, 2)
            }
            '<' if self.peek() == Some('=') => {
                self.advance_char();
                (Operator::LessEquals, 2)
            }
            '<' => (Operator::Less, 1),
            '>' if self.peek() == Some('=') => {
                self.advance_char();
                (Operator::GreaterEquals, 2)
            }
            '>' => (Operator::Greater, 1),
            _ => unreachable!("lex_operator only called for operator-leading characters"),
        };
        let _ = len;
        let tight_after = !self.peek().is_some_and(char::is_whitespace);
        let tight_before = !had_whitespace_before && start > 0;
        TokenKind::Operator(op, Adjacency { tight_before, tight_after })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expands a 3/4/6/8-digit hex color body to 8-bit RGBA: 3/4-digit forms
/// double each nibble.
fn expand_hex_digits(digits: &str) -> Option<[u8; 4]> {
    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|d| d as u8)
    }
    fn pair(hi: u8, lo: u8) -> u8 {
        hi << 4 | lo
    }

    let bytes = digits.as_bytes();
    match bytes.len() {
        3 | 4 => {
            let mut out = [0u8; 4];
            out[3] = 255;
            for (i, &b) in bytes.iter().enumerate() {
                let n = nibble(b)?;
                out[i] = pair(n, n);
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [0u8; 4];
            out[3] = 255;
            for i in 0..bytes.len() / 2 {
                let hi = nibble(bytes[i * 2])?;
                let lo = nibble(bytes[i * 2 + 1])?;
                out[i] = pair(hi, lo);
            }
            Some(out)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_cube() {
        let ks = kinds("cube");
        assert_eq!(ks, vec![TokenKind::Identifier("cube".into()), TokenKind::Eof]);
    }

    #[test]
    fn lexes_number_with_exponent() {
        let (tokens, err) = lex("1.5e-2");
        assert!(err.is_none());
        assert_eq!(tokens[0].kind, TokenKind::Number(1.5e-2));
    }

    #[test]
    fn lexes_leading_dot_number() {
        let (tokens, err) = lex(".5");
        assert!(err.is_none());
        assert_eq!(tokens[0].kind, TokenKind::Number(0.5));
    }

    #[test]
    fn expands_short_hex_colors() {
        let (tokens, _) = lex("#f00");
        assert_eq!(tokens[0].kind, TokenKind::HexColor([255, 0, 0, 255]));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let (_, err) = lex("\"abc");
        assert!(matches!(err.map(|e| e.kind), Some(LexErrorKind::UnterminatedString)));
    }

    #[test]
    fn invalid_escape_is_an_error() {
        let (_, err) = lex("\"a\\qb\"");
        assert!(matches!(err.map(|e| e.kind), Some(LexErrorKind::InvalidEscapeSequence('q'))));
    }

    #[test]
    fn crlf_collapses_to_one_linebreak() {
        let ks = kinds("a\r\nb");
        assert_eq!(
            ks,
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::LineBreak,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_ignored() {
        let ks = kinds("cube // a comment\nsphere");
        assert_eq!(
            ks,
            vec![
                TokenKind::Identifier("cube".into()),
                TokenKind::LineBreak,
                TokenKind::Identifier("sphere".into()),
                TokenKind::Eof,
            ]
        );
    }
}
