//! Typed value sinks for declared arguments and options.
//!
//! A [`Value`] is where a matched raw string finally lands. The matching
//! engine only ever hands strings over; conversion into the declared
//! [`ValueType`] happens here, through [`Value::set`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value type for options and positional arguments.
///
/// `Strings` and `Ints` are multi-valued: every matched occurrence is
/// appended instead of overwriting the previous one.
///
/// # Examples
///
/// ```
/// use argmatch_core::ValueType;
///
/// assert_eq!(ValueType::default(), ValueType::String);
/// assert!(ValueType::Strings.is_multi_valued());
/// assert!(!ValueType::Bool.is_multi_valued());
/// assert_eq!(ValueType::Ints.label(), "ints");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Boolean switch; may appear bare on the command line.
    Bool,
    /// Single string (the default).
    #[default]
    String,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Accumulating list of strings.
    Strings,
    /// Accumulating list of integers.
    Ints,
}

impl ValueType {
    pub fn is_multi_valued(self) -> bool {
        matches!(self, ValueType::Strings | ValueType::Ints)
    }

    pub fn label(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Strings => "strings",
            ValueType::Ints => "ints",
        }
    }
}

/// Failure to convert a raw string into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The raw text is not a valid boolean (`true` or `false`).
    #[error("invalid bool value {0:?}: expected true or false")]
    InvalidBool(String),
    /// The raw text is not a valid integer.
    #[error("invalid int value {0:?}")]
    InvalidInt(String),
    /// The raw text is not a valid float.
    #[error("invalid float value {0:?}")]
    InvalidFloat(String),
}

/// A typed value held by a container.
///
/// Serializes untagged so that bound values render naturally
/// (`true`, `"x"`, `[1, 2]`).
///
/// # Examples
///
/// ```
/// use argmatch_core::{Value, ValueType};
///
/// let mut v = Value::default_for(ValueType::Ints);
/// v.set("1").unwrap();
/// v.set("2").unwrap();
/// assert_eq!(v, Value::Ints(vec![1, 2]));
///
/// let mut flag = Value::default_for(ValueType::Bool);
/// assert!(flag.set("maybe").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    String(String),
    Int(i64),
    Float(f64),
    Strings(Vec<String>),
    Ints(Vec<i64>),
}

impl Value {
    /// The zero value for a type: `false`, `""`, `0`, `0.0` or an empty list.
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => Value::Bool(false),
            ValueType::String => Value::String(String::new()),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Strings => Value::Strings(Vec::new()),
            ValueType::Ints => Value::Ints(Vec::new()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Strings(_) => ValueType::Strings,
            Value::Ints(_) => ValueType::Ints,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_multi_valued(&self) -> bool {
        self.value_type().is_multi_valued()
    }

    /// Applies one raw string. Single values are replaced, lists are
    /// appended to. On error the value is left untouched.
    pub fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        match self {
            Value::Bool(b) => {
                *b = parse_bool(raw)?;
            }
            Value::String(s) => {
                *s = raw.to_string();
            }
            Value::Int(i) => {
                *i = parse_int(raw)?;
            }
            Value::Float(f) => {
                *f = raw
                    .parse()
                    .map_err(|_| ValueError::InvalidFloat(raw.to_string()))?;
            }
            Value::Strings(list) => list.push(raw.to_string()),
            Value::Ints(list) => list.push(parse_int(raw)?),
        }
        Ok(())
    }

    /// Empties a multi-valued value. Single values are left alone.
    pub fn clear(&mut self) {
        match self {
            Value::Strings(list) => list.clear(),
            Value::Ints(list) => list.clear(),
            _ => {}
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValueError::InvalidBool(raw.to_string())),
    }
}

fn parse_int(raw: &str) -> Result<i64, ValueError> {
    raw.parse()
        .map_err(|_| ValueError::InvalidInt(raw.to_string()))
}
