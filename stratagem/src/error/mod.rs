//! Error types and reporting

use crate::ast::BinOp;
use crate::interp::RuntimeError;
use crate::types::Type;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for type checking
pub type TypeResult<T> = std::result::Result<T, TypeError>;

/// Failure of a scope-chain operation, shared by both environment kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("unbound name: {0}")]
    Unbound(String),

    #[error("redeclaring existing name: {0}")]
    Redeclaration(String),
}

/// Typecheck-time error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unbound name: {name}")]
    UnboundName { name: String },

    #[error("redeclaring existing name: {name}")]
    Redeclaration { name: String },

    #[error("type mismatch in {context}: expected {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: Type,
        found: Type,
    },

    #[error("called a non-function of type {found}")]
    NotAFunction { found: Type },

    #[error("expected a reference, got {found}")]
    NotAReference { found: Type },
}

impl TypeError {
    pub fn mismatch(context: impl Into<String>, expected: Type, found: Type) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    pub fn operator_mismatch(op: BinOp, expected: Type, found: Type) -> Self {
        Self::mismatch(format!("operand of `{op}`"), expected, found)
    }
}

impl From<EnvError> for TypeError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::Unbound(name) => TypeError::UnboundName { name },
            EnvError::Redeclaration(name) => TypeError::Redeclaration { name },
        }
    }
}

/// Any failure of a typecheck-then-evaluate run
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// True when the failure points at a bug in the core rather than in the program
    pub fn is_internal(&self) -> bool {
        match self {
            Error::Type(_) => false,
            Error::Runtime(err) => err.is_fatal(),
        }
    }
}
