//! Stratagem Language Library
//!
//! A small expression language with gradual typing. Type checking rewrites
//! the tree, inserting runtime casts wherever dynamically-typed code meets
//! statically-typed code; evaluation then runs the rewritten tree.

pub mod ast;
pub mod env;
pub mod error;
pub mod interp;
pub mod types;

pub use ast::{BinOp, Constant, Expr};
pub use error::{Error, Result, TypeError, TypeResult};
pub use interp::{Interpreter, InterpreterConfig, RuntimeError, Value};
pub use types::{Type, TypeChecker};

/// Type check `expr` in an empty global scope
pub fn typecheck(expr: Expr) -> TypeResult<(Type, Expr)> {
    TypeChecker::new().check(expr)
}

/// Type check and then evaluate `expr`, printing to stdout
pub fn run(expr: Expr) -> Result<(Type, Value)> {
    let (ty, expr) = typecheck(expr)?;
    let value = Interpreter::new().run(&expr)?;
    Ok((ty, value))
}
