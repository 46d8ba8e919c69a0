use std::fmt;

use crate::value::TypeKey;

/// Error kind for leaf conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafErrorKind {
    /// Text could not be parsed into the target representation.
    Parse,
    /// Numeric or temporal value outside what the target can hold.
    Range,
    /// The leaf received a value of a type it was not written for.
    TypeMismatch,
    /// Name or ordinal does not denote a member of the enumeration.
    UnknownMember,
    /// A composed conversion produced an absent value in its first stage.
    AbsentIntermediate,
    /// Failure raised by a caller-supplied conversion function.
    Custom,
}

/// Leaf error: returned by every conversion function stored in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafError {
    pub kind: LeafErrorKind,
    pub message: String,
}

impl LeafError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self { kind: LeafErrorKind::Parse, message: msg.into() }
    }

    pub fn range(msg: impl Into<String>) -> Self {
        Self { kind: LeafErrorKind::Range, message: msg.into() }
    }

    pub fn mismatch(expected: &TypeKey, actual: &TypeKey) -> Self {
        Self {
            kind: LeafErrorKind::TypeMismatch,
            message: format!("expected {expected}, got {actual}"),
        }
    }

    pub fn unknown_member(enumeration: &str, member: impl fmt::Display) -> Self {
        Self {
            kind: LeafErrorKind::UnknownMember,
            message: format!("'{member}' is not a member of {enumeration}"),
        }
    }

    pub fn absent_intermediate(via: &TypeKey) -> Self {
        Self {
            kind: LeafErrorKind::AbsentIntermediate,
            message: format!("no value produced while converting through {via}"),
        }
    }

    pub fn custom(msg: impl Into<String>) -> Self {
        Self { kind: LeafErrorKind::Custom, message: msg.into() }
    }

    /// Add context to the error, preserving the original kind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for LeafError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for LeafError {}

// ---------------------------------------------------------------------------
// From impls: parse errors of the primitive representations → LeafError::Parse
// ---------------------------------------------------------------------------

impl From<std::num::ParseIntError> for LeafError {
    fn from(e: std::num::ParseIntError) -> Self {
        Self::parse(e.to_string())
    }
}

impl From<std::num::ParseFloatError> for LeafError {
    fn from(e: std::num::ParseFloatError) -> Self {
        Self::parse(e.to_string())
    }
}

impl From<chrono::ParseError> for LeafError {
    fn from(e: chrono::ParseError) -> Self {
        Self::parse(e.to_string())
    }
}

impl From<rust_decimal::Error> for LeafError {
    fn from(e: rust_decimal::Error) -> Self {
        Self::parse(e.to_string())
    }
}
