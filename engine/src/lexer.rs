//! Tokenizer for usage specs.
//!
//! The grammar is pure ASCII. Offsets are byte offsets into the spec text;
//! since every token boundary falls on an ASCII byte they are also valid
//! `str` slice boundaries.

use std::fmt;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An uppercase-by-convention identifier such as `SRC`.
    Positional,
    /// The `OPTIONS` shortcut.
    Options,
    /// `-x`
    ShortOpt,
    /// `--name`
    LongOpt,
    /// A run of short option letters, `-abc`. The text is the letters only.
    OptSeq,
    /// `=<name>` attached to an option.
    OptValue,
    /// `--`
    DoubleDash,
    OpenSq,
    CloseSq,
    OpenPar,
    ClosePar,
    /// `|`
    Choice,
    /// `...`
    Rep,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Positional => "positional",
            TokenKind::Options => "OPTIONS",
            TokenKind::ShortOpt => "short option",
            TokenKind::LongOpt => "long option",
            TokenKind::OptSeq => "option sequence",
            TokenKind::OptValue => "option value",
            TokenKind::DoubleDash => "--",
            TokenKind::OpenSq => "[",
            TokenKind::CloseSq => "]",
            TokenKind::OpenPar => "(",
            TokenKind::ClosePar => ")",
            TokenKind::Choice => "|",
            TokenKind::Rep => "...",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

/// Splits a usage spec into tokens.
///
/// # Errors
///
/// Returns a [`ParseError`] of kind `Lex` pointing at the first byte that
/// cannot start or continue a token.
///
/// # Examples
///
/// ```
/// use argmatch_engine::{TokenKind, tokenize};
///
/// let tokens = tokenize("[-f] SRC...").unwrap();
/// let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::OpenSq,
///         TokenKind::ShortOpt,
///         TokenKind::CloseSq,
///         TokenKind::Positional,
///         TokenKind::Rep,
///     ]
/// );
/// ```
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'[' => self.single(TokenKind::OpenSq),
                b']' => self.single(TokenKind::CloseSq),
                b'(' => self.single(TokenKind::OpenPar),
                b')' => self.single(TokenKind::ClosePar),
                b'|' => self.single(TokenKind::Choice),
                b'.' => self.ellipsis()?,
                b'-' => self.option()?,
                b'=' => self.option_value()?,
                c if c.is_ascii_alphabetic() => self.identifier(),
                _ => return Err(self.error("Unexpected input", self.pos)),
            }
        }
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, message: &str, offset: usize) -> ParseError {
        ParseError::lex(self.input, message, offset)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            text: self.input[start..end].to_string(),
            offset: start,
        });
    }

    fn single(&mut self, kind: TokenKind) {
        self.push(kind, self.pos, self.pos + 1);
        self.pos += 1;
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn ellipsis(&mut self) -> Result<(), ParseError> {
        if self.input[self.pos..].starts_with("...") {
            self.push(TokenKind::Rep, self.pos, self.pos + 3);
            self.pos += 3;
            Ok(())
        } else {
            Err(self.error("Unexpected input", self.pos))
        }
    }

    fn identifier(&mut self) {
        let start = self.pos;
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        let kind = if &self.input[start..self.pos] == "OPTIONS" {
            TokenKind::Options
        } else {
            TokenKind::Positional
        };
        self.push(kind, start, self.pos);
    }

    fn option(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        match self.peek() {
            None => Err(self.error("Unexpected end of input", self.pos)),
            Some(b'-') => {
                self.pos += 1;
                match self.peek() {
                    None => {
                        self.push(TokenKind::DoubleDash, start, self.pos);
                        Ok(())
                    }
                    Some(c) if ends_double_dash(c) => {
                        self.push(TokenKind::DoubleDash, start, self.pos);
                        Ok(())
                    }
                    Some(c) if c.is_ascii_alphabetic() => {
                        self.eat_while(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_');
                        self.push(TokenKind::LongOpt, start, self.pos);
                        self.option_boundary()
                    }
                    Some(_) => Err(self.error("Invalid long option", self.pos)),
                }
            }
            Some(c) if c.is_ascii_alphanumeric() => {
                let letters = self.pos;
                self.eat_while(|c| c.is_ascii_alphanumeric());
                if self.pos - letters == 1 {
                    self.push(TokenKind::ShortOpt, start, self.pos);
                } else {
                    self.push(TokenKind::OptSeq, letters, self.pos);
                }
                self.option_boundary()
            }
            Some(_) => Err(self.error("Invalid short option", self.pos)),
        }
    }

    /// An option name must be followed by whitespace, `=`, a bracket, `|`,
    /// `...` or the end of input.
    fn option_boundary(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(c) if c.is_ascii_whitespace() || b"=[]()|.".contains(&c) => Ok(()),
            Some(_) => Err(self.error("Unexpected character after option", self.pos)),
        }
    }

    fn option_value(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        if self.peek() != Some(b'<') {
            return Err(self.error("Was expecting <", self.pos));
        }
        self.pos += 1;
        let name = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated option value", self.pos)),
                Some(b'>') => break,
                Some(_) => self.pos += 1,
            }
        }
        if self.pos == name {
            return Err(self.error("Empty option value name", self.pos));
        }
        self.pos += 1;
        self.push(TokenKind::OptValue, start, self.pos);
        Ok(())
    }
}

fn ends_double_dash(c: u8) -> bool {
    c.is_ascii_whitespace() || b"[]()|.".contains(&c)
}
