//! # Scanner
//!
//! Turns SNARL source text into a token stream with one token of
//! lookahead.
//!
//! The parser drives the scanner: [`Scanner::token`] is the current token
//! and [`Scanner::next_token`] replaces it with the next one. Whitespace
//! and `#` comments are skipped between tokens. Tokens never cross a line
//! boundary; in particular a string constant left open at the end of its
//! line is the fatal error "missing closing quote".
//!
//! SNARL is plain ASCII, so the scanner walks the source bytes directly.
//! Instead of counting a column per character, it remembers where the
//! current line begins and derives a token's column from the distance to
//! that offset.

pub mod token;

#[cfg(test)]
mod tests;

use crate::error::{Diagnostic, ErrorKind, Span};
use token::{Token, TokenKind};

pub struct Scanner<'a> {
    bytes: &'a [u8],
    /// Offset of the next unread byte.
    pos: usize,
    /// 1-indexed line number of `pos`.
    line: usize,
    /// Offset of the first byte of the current line.
    line_start: usize,
    token: Token,
}

impl<'a> Scanner<'a> {
    /// Build a scanner positioned at the first token of `source`.
    pub fn new(source: &'a str) -> Result<Self, Diagnostic> {
        let mut scanner = Self {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            token: Token {
                kind: TokenKind::Eof,
                span: Span::new(1, 1),
            },
        };
        scanner.next_token()?;
        Ok(scanner)
    }

    /// The current (lookahead) token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> &TokenKind {
        &self.token.kind
    }

    pub fn span(&self) -> Span {
        self.token.span
    }

    /// The position of the next unread character.
    fn here(&self) -> Span {
        Span::new(self.line, self.pos - self.line_start + 1)
    }

    fn peek(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|&b| b as char)
    }

    /// Consume the next character, keeping the line bookkeeping current.
    fn take(&mut self) -> Option<char> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(byte as char)
    }

    /// True at a newline or at the end of the source; comments and string
    /// constants stop here.
    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n'))
    }

    /// Advance past the current token.
    pub fn next_token(&mut self) -> Result<(), Diagnostic> {
        self.skip_blank();
        let span = self.here();
        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(ch) => self.scan_token(ch, span)?,
        };
        log::trace!("token {:?} at {}:{}", kind, span.line, span.col);
        self.token = Token { kind, span };
        Ok(())
    }

    /// Skip whitespace and `#` comments (a comment runs through the end of
    /// its line, newline included).
    fn skip_blank(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\n' | '\r') => {
                    self.take();
                }
                Some('#') => {
                    while !self.at_line_end() {
                        self.take();
                    }
                    self.take(); // the newline itself
                }
                _ => return,
            }
        }
    }

    fn scan_token(&mut self, ch: char, span: Span) -> Result<TokenKind, Diagnostic> {
        match ch {
            '[' => self.single(TokenKind::OpenBracket),
            ']' => self.single(TokenKind::CloseBracket),
            '(' => self.single(TokenKind::OpenParen),
            ')' => self.single(TokenKind::CloseParen),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '=' => self.single(TokenKind::Equal),
            ':' => {
                self.take();
                if self.peek() == Some('=') {
                    self.take();
                    Ok(TokenKind::Assign)
                } else {
                    Ok(TokenKind::Colon)
                }
            }
            '<' => {
                self.take();
                match self.peek() {
                    Some('=') => {
                        self.take();
                        Ok(TokenKind::LessEqual)
                    }
                    Some('>') => {
                        self.take();
                        Ok(TokenKind::NotEqual)
                    }
                    _ => Ok(TokenKind::Less),
                }
            }
            '>' => {
                self.take();
                if self.peek() == Some('=') {
                    self.take();
                    Ok(TokenKind::GreaterEqual)
                } else {
                    Ok(TokenKind::Greater)
                }
            }
            '"' => self.scan_string(span),
            c if c.is_ascii_digit() => self.scan_integer(span),
            c if c.is_ascii_alphabetic() => Ok(self.scan_word()),
            _ => Err(Diagnostic::new(
                ErrorKind::UnrecognizedSymbol,
                format!("unrecognized symbol '{ch}'"),
                span,
            )),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Result<TokenKind, Diagnostic> {
        self.take();
        Ok(kind)
    }

    fn scan_string(&mut self, span: Span) -> Result<TokenKind, Diagnostic> {
        self.take(); // opening quote
        let mut text = String::new();
        loop {
            if self.at_line_end() {
                return Err(Diagnostic::new(
                    ErrorKind::MissingClosingQuote,
                    "missing closing quote",
                    span,
                ));
            }
            let ch = self.take().unwrap();
            if ch == '"' {
                return Ok(TokenKind::StringConstant(text));
            }
            text.push(ch);
        }
    }

    fn scan_integer(&mut self, span: Span) -> Result<TokenKind, Diagnostic> {
        let mut digits = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            digits.push(self.take().unwrap());
        }
        let value = digits.parse::<i32>().map_err(|_| {
            Diagnostic::new(
                ErrorKind::InvalidIntegerConstant,
                format!("invalid integer constant {digits}"),
                span,
            )
        })?;
        Ok(TokenKind::IntConstant(value, digits))
    }

    fn scan_word(&mut self) -> TokenKind {
        let mut word = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            word.push(self.take().unwrap());
        }
        TokenKind::reserved(&word).unwrap_or(TokenKind::Name(word))
    }
}
