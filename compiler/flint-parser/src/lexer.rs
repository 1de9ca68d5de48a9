//! The hand-written lexer. Preprocessor lines (`#include` and friends) are
//! skipped wholesale: the compiler's foreign functions are declared
//! implicitly, so the standard headers have nothing to contribute.

use crate::error::{ParseError, ParseResult};

/// A lexed token plus the line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    IntLit(i64),
    StrLit(String),

    // Keywords.
    KwInt,
    KwChar,
    KwShort,
    KwLong,
    KwBool,
    KwVoid,
    KwIf,
    KwElse,
    KwWhile,
    KwReturn,
    KwBreak,
    KwContinue,
    KwTrue,
    KwFalse,

    // Punctuation and operators.
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Amp,
    Caret,
    Pipe,
    Bang,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,

    Eof,
}

impl TokenKind {
    /// A short human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::IntLit(value) => format!("integer `{value}`"),
            TokenKind::StrLit(_) => "string literal".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            other => format!("`{other:?}`"),
        }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "int" => TokenKind::KwInt,
        "char" => TokenKind::KwChar,
        "short" => TokenKind::KwShort,
        "long" => TokenKind::KwLong,
        "bool" => TokenKind::KwBool,
        "void" => TokenKind::KwVoid,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "return" => TokenKind::KwReturn,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        _ => return None,
    })
}

pub struct Lexer<'src> {
    source: &'src [u8],
    position: usize,
    line: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source: source.as_bytes(), position: 0, line: 1 }
    }

    /// Lex the whole input, appending a trailing [TokenKind::Eof].
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.position + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        if byte == b'\n' {
            self.line += 1;
        }
        Some(byte)
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.bump();
                }
                // Preprocessor lines are ignored.
                Some(b'#') => {
                    while let Some(byte) = self.peek() {
                        if byte == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(byte) = self.peek() {
                        if byte == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start_line = self.line;
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(ParseError::new(
                                    "unterminated block comment",
                                    start_line,
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_trivia()?;
        let line = self.line;

        let Some(byte) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, line });
        };

        let kind = match byte {
            b'0'..=b'9' => self.lex_number()?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(),
            b'\'' => self.lex_char_literal()?,
            b'"' => self.lex_string_literal()?,
            _ => self.lex_operator()?,
        };

        Ok(Token { kind, line })
    }

    fn lex_number(&mut self) -> ParseResult<TokenKind> {
        let line = self.line;
        let start = self.position;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }

        let text = std::str::from_utf8(&self.source[start..self.position]).unwrap();
        text.parse::<i64>()
            .map(TokenKind::IntLit)
            .map_err(|_| ParseError::new(format!("integer literal `{text}` out of range"), line))
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.position;
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.bump();
        }

        let text = std::str::from_utf8(&self.source[start..self.position]).unwrap();
        keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }

    fn lex_char_literal(&mut self) -> ParseResult<TokenKind> {
        let line = self.line;
        self.bump();

        let value = match self.bump() {
            Some(b'\\') => {
                let escaped = self
                    .bump()
                    .ok_or_else(|| ParseError::new("unterminated character literal", line))?;
                unescape(escaped)
                    .ok_or_else(|| ParseError::new("unknown escape in character literal", line))?
            }
            Some(b'\'') | None => {
                return Err(ParseError::new("empty character literal", line));
            }
            Some(byte) => byte,
        };

        if self.bump() != Some(b'\'') {
            return Err(ParseError::new("unterminated character literal", line));
        }

        Ok(TokenKind::IntLit(i64::from(value)))
    }

    fn lex_string_literal(&mut self) -> ParseResult<TokenKind> {
        let line = self.line;
        self.bump();

        let mut value = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| ParseError::new("unterminated string literal", line))?;
                    let byte = unescape(escaped).ok_or_else(|| {
                        ParseError::new("unknown escape in string literal", line)
                    })?;
                    value.push(byte);
                }
                Some(byte) => value.push(byte),
                None => return Err(ParseError::new("unterminated string literal", line)),
            }
        }

        String::from_utf8(value)
            .map(TokenKind::StrLit)
            .map_err(|_| ParseError::new("string literal is not valid utf-8", line))
    }

    fn lex_operator(&mut self) -> ParseResult<TokenKind> {
        let line = self.line;
        let byte = self.bump().unwrap();
        let next = self.peek();

        let two = |lexer: &mut Self, kind| {
            lexer.bump();
            kind
        };

        Ok(match (byte, next) {
            (b'+', Some(b'+')) => two(self, TokenKind::PlusPlus),
            (b'+', Some(b'=')) => two(self, TokenKind::PlusAssign),
            (b'+', _) => TokenKind::Plus,
            (b'-', Some(b'-')) => two(self, TokenKind::MinusMinus),
            (b'-', Some(b'=')) => two(self, TokenKind::MinusAssign),
            (b'-', _) => TokenKind::Minus,
            (b'*', Some(b'=')) => two(self, TokenKind::StarAssign),
            (b'*', _) => TokenKind::Star,
            (b'/', Some(b'=')) => two(self, TokenKind::SlashAssign),
            (b'/', _) => TokenKind::Slash,
            (b'%', Some(b'=')) => two(self, TokenKind::PercentAssign),
            (b'%', _) => TokenKind::Percent,
            (b'=', Some(b'=')) => two(self, TokenKind::EqEq),
            (b'=', _) => TokenKind::Assign,
            (b'!', Some(b'=')) => two(self, TokenKind::NotEq),
            (b'!', _) => TokenKind::Bang,
            (b'<', Some(b'=')) => two(self, TokenKind::Le),
            (b'<', _) => TokenKind::Lt,
            (b'>', Some(b'=')) => two(self, TokenKind::Ge),
            (b'>', _) => TokenKind::Gt,
            (b'&', _) => TokenKind::Amp,
            (b'^', _) => TokenKind::Caret,
            (b'|', _) => TokenKind::Pipe,
            (b'(', _) => TokenKind::LParen,
            (b')', _) => TokenKind::RParen,
            (b'{', _) => TokenKind::LBrace,
            (b'}', _) => TokenKind::RBrace,
            (b'[', _) => TokenKind::LBracket,
            (b']', _) => TokenKind::RBracket,
            (b';', _) => TokenKind::Semi,
            (b',', _) => TokenKind::Comma,
            _ => {
                return Err(ParseError::new(
                    format!("unexpected character `{}`", byte as char),
                    line,
                ));
            }
        })
    }
}

fn unescape(byte: u8) -> Option<u8> {
    Some(match byte {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'0' => 0,
        b'\\' => b'\\',
        b'\'' => b'\'',
        b'"' => b'"',
        _ => return None,
    })
}
