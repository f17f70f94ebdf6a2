//! Type lattice and cast-inserting type checking
//!
//! Stratagem types form a small lattice with `Any` on top. Static code and
//! dynamically-typed code meet through the consistency relation `~`, which
//! is deliberately weaker than equality and not transitive.

mod check;

pub use check::TypeChecker;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// The dynamic type `?`
    Any,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// Immutable text
    String,
    /// Unit type ()
    Unit,
    /// Single-argument function: arg -> ret
    Closure(Box<Type>, Box<Type>),
    /// Mutable reference cell holding a value of the inner type
    Ref(Box<Type>),
}

impl Type {
    pub fn closure(arg: Type, ret: Type) -> Self {
        Type::Closure(Box::new(arg), Box::new(ret))
    }

    pub fn reference(cell: Type) -> Self {
        Type::Ref(Box::new(cell))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Leaves are everything except `Closure` and `Ref`
    pub fn is_composite(&self) -> bool {
        matches!(self, Type::Closure(_, _) | Type::Ref(_))
    }

    /// Gradual consistency `self ~ other`.
    ///
    /// Reflexive and symmetric, not transitive: `Int ~ ?` and `? ~ Bool`
    /// hold while `Int ~ Bool` does not. Closures are compared pointwise;
    /// reference cells are invariant and need identical cell types.
    pub fn consistent_with(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Bool, Type::Bool)
            | (Type::Int, Type::Int)
            | (Type::String, Type::String)
            | (Type::Unit, Type::Unit) => true,
            (Type::Closure(a1, r1), Type::Closure(a2, r2)) => {
                a1.consistent_with(a2) && r1.consistent_with(r2)
            }
            (Type::Ref(c1), Type::Ref(c2)) => c1 == c2,
            _ => false,
        }
    }

    /// Least common supertype of two types.
    ///
    /// Mismatched shapes collapse to `Any`. Reference types only join to
    /// themselves when the cell types are equal.
    pub fn join(&self, other: &Type) -> Type {
        match (self, other) {
            (Type::Bool, Type::Bool) => Type::Bool,
            (Type::Int, Type::Int) => Type::Int,
            (Type::String, Type::String) => Type::String,
            (Type::Unit, Type::Unit) => Type::Unit,
            (Type::Closure(a1, r1), Type::Closure(a2, r2)) => {
                Type::closure(a1.join(a2), r1.join(r2))
            }
            (Type::Ref(c1), Type::Ref(c2)) if c1 == c2 => self.clone(),
            _ => Type::Any,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "?"),
            Type::Bool => write!(f, "Bool"),
            Type::Int => write!(f, "Int"),
            Type::String => write!(f, "String"),
            Type::Unit => write!(f, "()"),
            Type::Closure(arg, ret) => match arg.as_ref() {
                Type::Closure(_, _) => write!(f, "({arg}) -> {ret}"),
                _ => write!(f, "{arg} -> {ret}"),
            },
            Type::Ref(cell) => match cell.as_ref() {
                Type::Closure(_, _) => write!(f, "ref ({cell})"),
                _ => write!(f, "ref {cell}"),
            },
        }
    }
}
