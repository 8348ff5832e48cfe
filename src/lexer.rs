// ABOUTME: Hand-written scanner turning HexScript source into a token stream

use crate::error::HexError;
use crate::token::{keyword_kind, Token, TokenKind, TokenValue};

/// Tokenizes HexScript source code.
///
/// Newlines are significant at statement level, so the scanner tracks a
/// bracket-nesting depth and suppresses `Newline` tokens inside `()`, `[]`
/// and `{}` groups, letting call arguments and collection literals span
/// lines freely.
pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    /// Position of the first character of the token being scanned.
    token_line: u32,
    token_column: u32,
    bracket_depth: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
            bracket_depth: 0,
        }
    }

    /// Tokenize the entire source, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, HexError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.token_line = self.line;
            self.token_column = self.column;
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, TokenValue::None, self.line, self.column));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), HexError> {
        let c = self.advance();

        match c {
            ' ' | '\t' | '\r' => Ok(()),

            '\n' => {
                if self.bracket_depth == 0 {
                    self.add_token(TokenKind::Newline, TokenValue::Lexeme("\n".into()));
                }
                self.line += 1;
                self.column = 1;
                Ok(())
            }

            '~' => {
                if self.peek() == '~' {
                    self.block_comment()
                } else {
                    self.line_comment();
                    Ok(())
                }
            }

            '"' | '\'' => self.string(c),

            _ if c.is_ascii_digit() => {
                self.number();
                Ok(())
            }

            _ if c.is_alphabetic() || c == '_' => {
                self.identifier();
                Ok(())
            }

            '*' => {
                if self.match_char('*') {
                    self.add_token(TokenKind::Power, TokenValue::Lexeme("**".into()));
                } else {
                    self.add_token(TokenKind::Star, TokenValue::Lexeme("*".into()));
                }
                Ok(())
            }

            '+' => self.punct(TokenKind::Plus, c),
            '-' => self.punct(TokenKind::Minus, c),
            '/' => self.punct(TokenKind::Slash, c),
            '%' => self.punct(TokenKind::Percent, c),
            ',' => self.punct(TokenKind::Comma, c),
            ':' => self.punct(TokenKind::Colon, c),
            '.' => self.punct(TokenKind::Dot, c),

            '(' | '[' | '{' => {
                self.bracket_depth += 1;
                let kind = match c {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                };
                self.punct(kind, c)
            }
            ')' | ']' | '}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                let kind = match c {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                };
                self.punct(kind, c)
            }

            _ => Err(HexError::dark_magic(
                format!("Unexpected character '{}'", c),
                self.token_line,
                self.token_column,
            )),
        }
    }

    fn punct(&mut self, kind: TokenKind, c: char) -> Result<(), HexError> {
        self.add_token(kind, TokenValue::Lexeme(c.to_string()));
        Ok(())
    }

    fn string(&mut self, quote: char) -> Result<(), HexError> {
        let mut value = String::new();
        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\n' {
                self.line += 1;
                self.column = 1;
            }
            if self.peek() == '\\' && self.peek_next() != '\0' {
                self.advance(); // backslash
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    // Any other escape collapses to the bare following
                    // character; the backslash is never kept
                    other => {
                        if other == '\n' {
                            self.line += 1;
                            self.column = 1;
                        }
                        value.push(other);
                    }
                }
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(HexError::dark_magic(
                "Unterminated string",
                self.line,
                self.column,
            ));
        }

        self.advance(); // closing quote
        self.add_token(TokenKind::Str, TokenValue::Str(value));
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            let text: String = self.source[self.start..self.current].iter().collect();
            let value: f64 = text.parse().unwrap_or(0.0);
            self.add_token(TokenKind::Float, TokenValue::Float(value));
        } else {
            let text: String = self.source[self.start..self.current].iter().collect();
            let value: i64 = text.parse().unwrap_or(0);
            self.add_token(TokenKind::Integer, TokenValue::Int(value));
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        match keyword_kind(&text) {
            Some(kind) => self.add_token(kind, TokenValue::Lexeme(text)),
            None => self.add_token(TokenKind::Identifier, TokenValue::Lexeme(text)),
        }
    }

    fn line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn block_comment(&mut self) -> Result<(), HexError> {
        self.advance(); // second ~
        while !self.is_at_end() {
            if self.peek() == '~' && self.peek_next() == '~' {
                self.advance();
                self.advance();
                return Ok(());
            }
            if self.peek() == '\n' {
                self.line += 1;
                self.column = 1;
            }
            self.advance();
        }
        Err(HexError::dark_magic(
            "Unterminated multi-line comment",
            self.line,
            self.column,
        ))
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        self.column += 1;
        true
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn add_token(&mut self, kind: TokenKind, value: TokenValue) {
        self.tokens
            .push(Token::new(kind, value, self.token_line, self.token_column));
    }
}
