//! Type descriptors for Brolga
//!
//! The language has three primitive types, arrays of arbitrary nesting
//! depth, and optionals. Two descriptors are equal iff their structural
//! form is identical; the only asymmetric relation is assignability into
//! an optional slot, which the analyzer checks at declaration sites.

use serde::{Serialize, Serializer};
use std::fmt;

/// Resolved type of an expression or declared slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Number,
    Boolean,
    Str,
    /// Unconstrained: the element type of `[]`, and the payload of the
    /// nil literal's `any?`
    Any,
    Array(Box<Type>),
    Optional(Box<Type>),
}

impl Type {
    pub fn array(element: Type) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn optional(inner: Type) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// The type of the nil literal before contextual narrowing
    pub fn nil() -> Self {
        Self::Optional(Box::new(Self::Any))
    }

    pub fn is_number_or_string(&self) -> bool {
        matches!(self, Self::Number | Self::Str)
    }

    pub fn is_string_or_array(&self) -> bool {
        matches!(self, Self::Str | Self::Array(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Str => write!(f, "string"),
            Self::Any => write!(f, "any"),
            Self::Array(element) => write!(f, "{}[]", element),
            Self::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
