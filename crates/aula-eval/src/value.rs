//! Runtime values.

use aula_types::ast::Literal;
use aula_types::DataType;
use std::fmt;

/// Handle to an array owned by the run's [`ArrayStore`](crate::ArrayStore).
///
/// Copying the handle aliases the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayRef(pub(crate) usize);

/// A tagged runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Null,
    Array(ArrayRef),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Decimal(_) => DataType::Decimal,
            Value::Boolean(_) => DataType::Boolean,
            Value::Char(_) => DataType::Char,
            Value::String(_) => DataType::String,
            Value::Null => DataType::Null,
            Value::Array(_) => DataType::Array,
        }
    }

    /// The value an uninitialized variable of `data_type` holds.
    pub fn default_for(data_type: DataType) -> Value {
        match data_type {
            DataType::Integer => Value::Integer(0),
            DataType::Decimal => Value::Decimal(0.0),
            DataType::Boolean => Value::Boolean(false),
            DataType::Char => Value::Char('\0'),
            DataType::String => Value::String(String::new()),
            DataType::Null | DataType::Array => Value::Null,
        }
    }

    pub fn from_literal(literal: &Literal) -> Value {
        match literal {
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Decimal(d) => Value::Decimal(*d),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Char(c) => Value::Char(*c),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Null => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of Integer, Decimal and Char (code point) values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Decimal(d) => Some(*d),
            Value::Char(c) => Some(u32::from(*c) as f64),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Canonical text of a scalar. Arrays are rendered by the store.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::String(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Array(r) => write!(f, "<array #{}>", r.0),
        }
    }
}
