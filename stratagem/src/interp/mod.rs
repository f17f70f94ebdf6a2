//! Evaluator for type-checked Stratagem trees

mod error;
mod eval;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::Interpreter;
pub use value::{Closure, Reference, Value};

/// Interpreter resource limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum nesting of closure calls before `StackOverflow`
    pub max_call_depth: usize,
    /// Remaining native stack that triggers growth
    pub stack_red_zone: usize,
    /// Size of each native stack extension
    pub stack_grow_size: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: 100_000,
            stack_red_zone: 128 * 1024,
            stack_grow_size: 4 * 1024 * 1024,
        }
    }
}
