//! Error types for spec compilation and argv matching.
//!
//! Spec-time failures (lexing and compiling) are positioned [`ParseError`]s
//! rendered against the spec text. Match-time failures are [`MatchError`]s
//! and carry no position.

use argmatch_core::{ValidationError, ValueError};
use thiserror::Error;

/// Which stage rejected a usage spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed spec text.
    Lex,
    /// Well-formed tokens that do not form a valid spec, or that reference
    /// undeclared names.
    Compile,
}

/// A positioned error in a usage spec.
///
/// The `Display` output points at the offending byte with a caret:
///
/// ```text
/// Undeclared option -x at offset 4
/// SRC -x
///     ^
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}\n{input}\n{}^", caret_padding(.input, .offset))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The full spec text.
    pub input: String,
    pub message: String,
    /// Byte offset into `input`.
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn lex(input: &str, message: impl Into<String>, offset: usize) -> Self {
        Self {
            kind: ParseErrorKind::Lex,
            input: input.to_string(),
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn compile(input: &str, message: impl Into<String>, offset: usize) -> Self {
        Self {
            kind: ParseErrorKind::Compile,
            input: input.to_string(),
            message: message.into(),
            offset,
        }
    }
}

fn caret_padding(input: &str, offset: &usize) -> String {
    let width = input
        .get(..*offset)
        .map_or(*offset, |prefix| prefix.chars().count());
    " ".repeat(width)
}

/// Failure to bind an argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The argv does not satisfy the compiled usage spec.
    #[error("incorrect usage")]
    IncorrectUsage,
    /// A matched raw value could not be applied to its container.
    #[error("invalid value for {name}: {source}")]
    InvalidValue { name: String, source: ValueError },
}

/// Any error surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The usage spec did not compile.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The argv did not match.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The command declaration is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
