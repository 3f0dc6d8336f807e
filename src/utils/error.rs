//! Error handling for the Brolga compiler

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Every variant carries the span of the offending node. Analysis is
/// fail-fast: the first violation is raised to the caller and nothing is
/// collected or recovered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected identifier")]
    ExpectedIdent { span: Span },

    #[error("Expected type")]
    ExpectedType { span: Span },

    #[error("Expected expression")]
    ExpectedExpr { span: Span },

    // ==================== Semantic Errors ====================

    #[error("Variable already declared: {name}")]
    AlreadyDeclared { name: String, span: Span },

    #[error("{name} not declared")]
    NotDeclared { name: String, span: Span },

    #[error("{name} not a function")]
    NotAFunction { name: String, span: Span },

    #[error("Expected number")]
    ExpectedNumber { span: Span },

    #[error("Expected boolean")]
    ExpectedBoolean { span: Span },

    #[error("Expected number or string")]
    ExpectedNumberOrString { span: Span },

    #[error("Expected string or array")]
    ExpectedStringOrArray { span: Span },

    #[error("Operands must have the same type")]
    SameTypeExpected { span: Span },

    #[error("All elements must have the same type")]
    MixedElementTypes { span: Span },

    #[error("Type mismatch")]
    TypeMismatch { span: Span },

    #[error("Cannot assign {from} to {target}")]
    NotAssignable {
        from: String,
        target: String,
        span: Span,
    },

    #[error("Assignment to immutable variable")]
    ImmutableAssignment { span: Span },

    #[error("Expected {expected} argument(s) but {got} passed")]
    ArgCountMismatch {
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Break can only appear in a loop")]
    BreakOutsideLoop { span: Span },

    #[error("Cannot infer type of nil")]
    UninferableNil { span: Span },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::ExpectedIdent { span } => *span,
            Self::ExpectedType { span } => *span,
            Self::ExpectedExpr { span } => *span,
            Self::AlreadyDeclared { span, .. } => *span,
            Self::NotDeclared { span, .. } => *span,
            Self::NotAFunction { span, .. } => *span,
            Self::ExpectedNumber { span } => *span,
            Self::ExpectedBoolean { span } => *span,
            Self::ExpectedNumberOrString { span } => *span,
            Self::ExpectedStringOrArray { span } => *span,
            Self::SameTypeExpected { span } => *span,
            Self::MixedElementTypes { span } => *span,
            Self::TypeMismatch { span } => *span,
            Self::NotAssignable { span, .. } => *span,
            Self::ImmutableAssignment { span } => *span,
            Self::ArgCountMismatch { span, .. } => *span,
            Self::BreakOutsideLoop { span } => *span,
            Self::UninferableNil { span } => *span,
        }
    }
}
