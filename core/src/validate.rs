//! Command declaration validation.
//!
//! Catches structural errors such as malformed option aliases, duplicate
//! names and unparsable defaults before a usage spec is compiled against
//! the declaration.
//!
//! # Examples
//!
//! ```
//! use argmatch_core::*;
//!
//! let cmd = CommandDecl::new("cp").with_option(OptionDecl::boolean(&["-r", "--recursive"]));
//! assert!(validate_command(&cmd).is_empty());
//!
//! // Invalid: short option missing its leading dash
//! let bad = CommandDecl::new("cp").with_option(OptionDecl::boolean(&["r"]));
//! assert!(!validate_command(&bad).is_empty());
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::{CommandDecl, OptionDecl};
use crate::value::{Value, ValueError};

static SHORT_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[A-Za-z0-9]$").expect("static regex must compile"));
static LONG_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--[A-Za-z][A-Za-z0-9_-]*$").expect("static regex must compile")
});
static ARG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("static regex must compile"));

/// Declaration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// An option declares no alias at all.
    #[error("option must define at least one name")]
    MissingOptionName,
    /// A single-dash alias that is not `-x`.
    #[error("invalid short option format: {0}")]
    InvalidShortOption(String),
    /// A double-dash alias that is not `--name`.
    #[error("invalid long option format: {0}")]
    InvalidLongOption(String),
    /// Two options share an alias.
    #[error("duplicate option: {0}")]
    DuplicateOption(String),
    /// Argument name is not an uppercase identifier.
    #[error("invalid argument name: {0}")]
    InvalidArgName(String),
    /// Two arguments share a name.
    #[error("duplicate argument: {0}")]
    DuplicateArg(String),
    /// The declared default does not parse as the declared type.
    #[error("invalid default for {name}: {source}")]
    InvalidDefault { name: String, source: ValueError },
}

/// Validates a command declaration.
///
/// Returns at most one error: validation stops at the first problem found.
///
/// # Examples
///
/// ```
/// use argmatch_core::*;
///
/// let cmd = CommandDecl::new("tool")
///     .with_arg(ArgDecl::new("IN", ValueType::Int).with_default("ten"));
/// let errors = validate_command(&cmd);
/// assert!(matches!(errors[0], ValidationError::InvalidDefault { .. }));
/// ```
pub fn validate_command(decl: &CommandDecl) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if decl.name.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return errors;
    }

    errors.extend(validate_options(&decl.options));
    if !errors.is_empty() {
        return errors;
    }

    let mut seen = HashSet::new();
    for arg in &decl.args {
        if !ARG_NAME.is_match(&arg.name) {
            errors.push(ValidationError::InvalidArgName(arg.name.clone()));
            return errors;
        }
        if !seen.insert(arg.name.as_str()) {
            errors.push(ValidationError::DuplicateArg(arg.name.clone()));
            return errors;
        }
        if let Err(err) = check_default(arg.value_type, arg.default.as_deref(), &arg.name) {
            errors.push(err);
            return errors;
        }
    }

    errors
}

fn validate_options(options: &[OptionDecl]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for option in options {
        if option.names.is_empty() {
            errors.push(ValidationError::MissingOptionName);
            return errors;
        }

        for name in &option.names {
            if name.starts_with("--") {
                if !LONG_OPTION.is_match(name) {
                    errors.push(ValidationError::InvalidLongOption(name.clone()));
                    return errors;
                }
            } else if !SHORT_OPTION.is_match(name) {
                errors.push(ValidationError::InvalidShortOption(name.clone()));
                return errors;
            }

            if !seen.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateOption(name.clone()));
                return errors;
            }
        }

        if let Err(err) = check_default(
            option.value_type,
            option.default.as_deref(),
            option.canonical_name(),
        ) {
            errors.push(err);
            return errors;
        }
    }

    errors
}

fn check_default(
    value_type: crate::ValueType,
    default: Option<&str>,
    owner: &str,
) -> Result<(), ValidationError> {
    let Some(raw) = default else {
        return Ok(());
    };
    Value::default_for(value_type)
        .set(raw)
        .map_err(|source| ValidationError::InvalidDefault {
            name: owner.to_string(),
            source,
        })
}
