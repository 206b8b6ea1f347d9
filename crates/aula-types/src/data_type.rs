use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of runtime kinds.
///
/// `Array` marks array-valued results; the element kind of an array is
/// always one of the six scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Decimal,
    Boolean,
    Char,
    String,
    Null,
    Array,
}

impl DataType {
    /// Number of scalar kinds, i.e. the side length of a dominance table.
    pub const SCALARS: usize = 6;

    /// Row/column of this kind in a dominance table. `None` for `Array`.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Integer => Some(0),
            Self::Decimal => Some(1),
            Self::Boolean => Some(2),
            Self::Char => Some(3),
            Self::String => Some(4),
            Self::Null => Some(5),
            Self::Array => None,
        }
    }

    /// Integer, Decimal or Char: the kinds that support ordering.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Char)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Char => "Char",
            Self::String => "String",
            Self::Null => "Null",
            Self::Array => "Array",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
