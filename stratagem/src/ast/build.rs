//! Constructors for building trees by hand

use super::{BinOp, Constant, Expr};
use crate::types::Type;
use std::rc::Rc;

impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Value(Constant::Int(n))
    }

    pub fn bool(b: bool) -> Self {
        Expr::Value(Constant::Bool(b))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Value(Constant::Str(s.into()))
    }

    pub fn unit() -> Self {
        Expr::Value(Constant::Unit)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn binop(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn if_(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// `fn(param: param_type)[: return_type] { body }`
    pub fn func(
        param: impl Into<String>,
        param_type: Type,
        return_type: Option<Type>,
        body: Expr,
    ) -> Self {
        Expr::FunctionDecl {
            param: param.into(),
            param_type,
            return_type,
            body: Rc::new(body),
        }
    }

    pub fn app(callee: Expr, arg: Expr) -> Self {
        Expr::FunctionApp {
            callee: Box::new(callee),
            arg: Box::new(arg),
        }
    }

    pub fn seq(exprs: Vec<Expr>) -> Self {
        Expr::Seq(exprs)
    }

    pub fn let_(name: impl Into<String>, declared_type: Option<Type>, value: Expr) -> Self {
        Expr::Let {
            name: name.into(),
            declared_type,
            value: Box::new(value),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn deref(target: Expr) -> Self {
        Expr::Deref(Box::new(target))
    }

    pub fn new_ref(value: Expr) -> Self {
        Expr::Ref {
            value: Box::new(value),
            cell_type: None,
        }
    }

    pub fn print(arg: Expr) -> Self {
        Expr::Print(Box::new(arg))
    }

    pub fn cast(target: Type, body: Expr) -> Self {
        Expr::Cast {
            target,
            body: Box::new(body),
        }
    }
}
