use crate::error::LexError;
use crate::gp::grammar::token::{Span, Token, TokenKind};

pub type LexResult<T> = Result<T, LexError>;

/// Splits expression text into tokens.
///
/// Newlines, spaces, tabs and commas only separate tokens and are skipped.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_separators();

        let start = self.pos;
        let byte = match self.peek() {
            Some(byte) => byte,
            None => return Ok(self.token(TokenKind::Eof, start)),
        };

        match byte {
            b'(' => {
                self.pos += 1;
                Ok(self.token(TokenKind::OpenParen, start))
            }
            b')' => {
                self.pos += 1;
                Ok(self.token(TokenKind::CloseParen, start))
            }
            b'a'..=b'z' | b'A'..=b'Z' => {
                self.eat_while(|b| b.is_ascii_alphabetic());
                self.eat_while(|b| b.is_ascii_digit());
                Ok(self.token(TokenKind::Identifier, start))
            }
            b'-' | b'0'..=b'9' => self.number(start),
            _ => Err(self.unrecognized(start)),
        }
    }

    // -?[0-9]+(\.[0-9]+)?
    fn number(&mut self, start: usize) -> LexResult<Token<'a>> {
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        if self.eat_while(|b| b.is_ascii_digit()) == 0 {
            return Err(self.unrecognized(start));
        }
        if self.peek() == Some(b'.') && self.peek_at(1).map_or(false, |b| b.is_ascii_digit()) {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit());
        }
        Ok(self.token(TokenKind::Number, start))
    }

    fn skip_separators(&mut self) {
        self.eat_while(|b| matches!(b, b'\n' | b'\r' | b' ' | b'\t' | b','));
    }

    fn eat_while<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(u8) -> bool,
    {
        let start = self.pos;
        while self.peek().map_or(false, &predicate) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).cloned()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        let span = Span {
            start,
            end: self.pos,
        };
        Token::new(kind, &self.input[start..self.pos], span)
    }

    fn unrecognized(&self, position: usize) -> LexError {
        let character = self.input[position..].chars().next().unwrap_or('\0');
        LexError::UnrecognizedCharacter {
            character,
            position,
        }
    }
}

/// Lex the whole input, ending with an `Eof` token.
pub fn lex(input: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if eof {
            return Ok(tokens);
        }
    }
}
