//! Runtime errors for the interpreter

use super::Value;
use crate::error::EnvError;
use crate::types::Type;
use thiserror::Error;

/// Runtime error during interpretation
#[derive(Debug, Clone, Error)]
#[error("Runtime error: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Name not bound anywhere in the scope chain
    UnboundName,
    /// Name declared twice in one scope
    Redeclaration,
    /// A cast node's check failed
    Cast,
    /// Division or modulo by zero
    DivisionByZero,
    /// Too many nested closure calls
    StackOverflow,
    /// Writing `print` output failed
    Io,
    /// A statically guaranteed type did not hold at runtime
    Internal,
    /// Evaluation reached a node the type checker has not annotated
    NotTypechecked,
}

impl RuntimeError {
    pub fn unbound_name(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UnboundName,
            message: format!("unbound name: {name}"),
        }
    }

    pub fn redeclaration(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::Redeclaration,
            message: format!("redeclaring existing name: {name}"),
        }
    }

    pub fn cast_failed(value: &Value, actual: &Type, target: &Type) -> Self {
        RuntimeError {
            kind: ErrorKind::Cast,
            message: format!(
                "cast failed: {value} of type {actual} is not consistent with {target}"
            ),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "division by zero".to_string(),
        }
    }

    pub fn stack_overflow(depth: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: format!("stack overflow: more than {depth} nested calls"),
        }
    }

    pub fn io_error(err: &std::io::Error) -> Self {
        RuntimeError {
            kind: ErrorKind::Io,
            message: format!("IO error: {err}"),
        }
    }

    /// Invariant break in cast insertion; `expected` should have been guaranteed
    pub fn internal(expected: &str, got: &Value) -> Self {
        RuntimeError {
            kind: ErrorKind::Internal,
            message: format!(
                "internal error: expected {expected}, got {} `{got}`",
                got.type_name()
            ),
        }
    }

    pub fn not_typechecked(node: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::NotTypechecked,
            message: format!("{node} evaluated before type checking"),
        }
    }

    /// Fatal errors indicate a bug in the core, not in the Stratagem program
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal | ErrorKind::NotTypechecked)
    }
}

impl From<EnvError> for RuntimeError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::Unbound(name) => RuntimeError::unbound_name(&name),
            EnvError::Redeclaration(name) => RuntimeError::redeclaration(&name),
        }
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
