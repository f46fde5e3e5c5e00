//! # Value Type System
//!
//! Core cell value types: Int, Double, Str, Bool. One variant per attribute
//! type the loader can parse, with equality and hashing that compare the
//! type tag and the typed value together.
//!
//! Doubles are compared and hashed bitwise so that hashing stays consistent
//! with equality (`NaN == NaN`, `0.0 != -0.0` under this relation). Values
//! come from CSV cells and are never computed on, so IEEE comparison
//! semantics are not needed here.
//!
//! ## Usage
//!
//! ```
//! use panda::value::{DataType, Value};
//!
//! let v = DataType::Double.parse_text("2.5").unwrap();
//! assert_eq!(v, Value::Double(2.5));
//! assert!(DataType::Int.parse_text("2.5").is_err());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::ser::{Serialize, Serializer};
use thiserror::Error;

/// Attribute types the loader can parse cells into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer
    Int,
    /// IEEE double
    Double,
    /// UTF-8 text
    Str,
    /// Boolean (`true`/`false`, case-insensitive)
    Bool,
}

impl DataType {
    /// Parse a declared type name as written in a schema entry.
    pub fn parse_name(name: &str) -> Option<DataType> {
        match name {
            "int" => Some(DataType::Int),
            "double" => Some(DataType::Double),
            "string" => Some(DataType::Str),
            "bool" => Some(DataType::Bool),
            _ => None,
        }
    }

    /// Parse a raw text cell into a value of this type.
    pub fn parse_text(self, text: &str) -> Result<Value, ParseValueError> {
        let fail = || ParseValueError {
            ty: self,
            text: text.to_string(),
        };
        match self {
            DataType::Int => text.parse::<i64>().map(Value::Int).map_err(|_| fail()),
            DataType::Double => text.parse::<f64>().map(Value::Double).map_err(|_| fail()),
            DataType::Str => Ok(Value::Str(Arc::from(text))),
            DataType::Bool => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(fail())
                }
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "int",
            DataType::Double => "double",
            DataType::Str => "string",
            DataType::Bool => "bool",
        };
        write!(f, "{name}")
    }
}

/// A cell value failed to parse as its declared type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot parse {text:?} as {ty}")]
pub struct ParseValueError {
    pub ty: DataType,
    pub text: String,
}

/// A typed cell value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Double(f64),
    Str(Arc<str>),
    Bool(bool),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Double(_) => DataType::Double,
            Value::Str(_) => DataType::Str,
            Value::Bool(_) => DataType::Bool,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Int(v) => {
                state.write_u8(0);
                v.hash(state);
            }
            Value::Double(v) => {
                state.write_u8(1);
                v.to_bits().hash(state);
            }
            Value::Str(v) => {
                state.write_u8(2);
                v.hash(state);
            }
            Value::Bool(v) => {
                state.write_u8(3);
                v.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Bool(v) => serializer.serialize_bool(*v),
        }
    }
}
