//! Expression AST nodes

use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal constant
    Value(Constant),

    /// Variable reference
    Var(String),

    /// Binary operation
    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Conditional: if cond then then_branch else else_branch
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Single-parameter function literal.
    ///
    /// `return_type` is `None` until type checking infers it. The body is
    /// shared with every closure value created from this node.
    FunctionDecl {
        param: String,
        param_type: Type,
        return_type: Option<Type>,
        body: Rc<Expr>,
    },

    /// Function application
    FunctionApp { callee: Box<Expr>, arg: Box<Expr> },

    /// Sequence: expr1; expr2; ...; result
    Seq(Vec<Expr>),

    /// Declaration in the current scope: let name [: ty] = value
    Let {
        name: String,
        declared_type: Option<Type>,
        value: Box<Expr>,
    },

    /// Store into a reference cell: target := value
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// Read a reference cell: !target
    Deref(Box<Expr>),

    /// Allocate a reference cell: ref value
    ///
    /// `cell_type` is fixed by type checking and tags the runtime cell.
    Ref {
        value: Box<Expr>,
        cell_type: Option<Type>,
    },

    /// Emit the textual form of a value
    Print(Box<Expr>),

    /// Runtime check inserted at a gradual-typing boundary
    Cast { target: Type, body: Box<Expr> },
}

/// Literal payload of `Expr::Value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Str(String),
    Unit,
}

impl Constant {
    /// Intrinsic type of the literal
    pub fn type_of(&self) -> Type {
        match self {
            Constant::Bool(_) => Type::Bool,
            Constant::Int(_) => Type::Int,
            Constant::Str(_) => Type::String,
            Constant::Unit => Type::Unit,
        }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl BinOp {
    /// `==` and `!=` accept any pair of consistent operand types
    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Gt | BinOp::Ge | BinOp::Lt | BinOp::Le)
    }

    /// Static result type of the operator
    pub fn result_type(self) -> Type {
        if self.is_equality() || self.is_comparison() {
            Type::Bool
        } else {
            Type::Int
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
        };
        write!(f, "{s}")
    }
}

impl Expr {
    /// Number of `Cast` nodes in the tree
    pub fn cast_count(&self) -> usize {
        match self {
            Expr::Value(_) | Expr::Var(_) => 0,
            Expr::BinOp { lhs, rhs, .. } => lhs.cast_count() + rhs.cast_count(),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => cond.cast_count() + then_branch.cast_count() + else_branch.cast_count(),
            Expr::FunctionDecl { body, .. } => body.cast_count(),
            Expr::FunctionApp { callee, arg } => callee.cast_count() + arg.cast_count(),
            Expr::Seq(exprs) => exprs.iter().map(Expr::cast_count).sum(),
            Expr::Let { value, .. } => value.cast_count(),
            Expr::Assign { target, value } => target.cast_count() + value.cast_count(),
            Expr::Deref(inner) | Expr::Print(inner) => inner.cast_count(),
            Expr::Ref { value, .. } => value.cast_count(),
            Expr::Cast { body, .. } => 1 + body.cast_count(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Unit => write!(f, "()"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Value(c) => write!(f, "{c}"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::BinOp { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "if {cond} {{ {then_branch} }} else {{ {else_branch} }}"),
            Expr::FunctionDecl {
                param,
                param_type,
                return_type,
                body,
            } => match return_type {
                Some(ret) => write!(f, "fn({param}: {param_type}): {ret} {{ {body} }}"),
                None => write!(f, "fn({param}: {param_type}) {{ {body} }}"),
            },
            Expr::FunctionApp { callee, arg } => match callee.as_ref() {
                Expr::FunctionDecl { .. } | Expr::Cast { .. } => write!(f, "({callee})({arg})"),
                _ => write!(f, "{callee}({arg})"),
            },
            Expr::Seq(exprs) => {
                if exprs.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, " }}")
            }
            Expr::Let {
                name,
                declared_type,
                value,
            } => match declared_type {
                Some(ty) => write!(f, "let {name}: {ty} = {value}"),
                None => write!(f, "let {name} = {value}"),
            },
            Expr::Assign { target, value } => write!(f, "{target} := {value}"),
            Expr::Deref(inner) => write!(f, "!{inner}"),
            Expr::Ref { value, .. } => write!(f, "ref {value}"),
            Expr::Print(inner) => write!(f, "print({inner})"),
            Expr::Cast { target, body } => write!(f, "<{target}>{body}"),
        }
    }
}
