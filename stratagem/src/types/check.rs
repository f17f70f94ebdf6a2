//! Type checking with cast insertion
//!
//! Every node consumes itself and hands back its type together with a
//! rewritten subtree. Wherever a value crosses from `?` into a concrete
//! expectation, or two branches disagree, the child is wrapped in a
//! `Cast` node that the evaluator checks at runtime.

use super::Type;
use crate::ast::{BinOp, Expr};
use crate::env::{child_env, TypeEnvRef, TypeEnvironment};
use crate::error::{TypeError, TypeResult};
use std::rc::Rc;

/// Program-level type checker owning the global type scope
#[derive(Debug)]
pub struct TypeChecker {
    global_env: TypeEnvRef,
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            global_env: TypeEnvironment::new().into_ref(),
        }
    }

    /// Bind a host-provided name before checking
    pub fn declare(&mut self, name: impl Into<String>, ty: Type) -> TypeResult<()> {
        self.global_env.borrow_mut().create(name, ty)?;
        Ok(())
    }

    pub fn global_env(&self) -> &TypeEnvRef {
        &self.global_env
    }

    /// Check a whole program, returning its type and the cast-annotated tree
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn check(&mut self, expr: Expr) -> TypeResult<(Type, Expr)> {
        let (ty, expr) = expr.typecheck(&self.global_env)?;
        tracing::debug!(%ty, casts = expr.cast_count(), "typecheck complete");
        Ok((ty, expr))
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap `expr` in a runtime check against `target`
fn insert_cast(rule: &'static str, target: Type, expr: Expr) -> Expr {
    tracing::debug!(rule, %target, "inserting cast");
    Expr::cast(target, expr)
}

impl Expr {
    /// Type check this node in `env`, returning its type and rewritten form
    pub fn typecheck(self, env: &TypeEnvRef) -> TypeResult<(Type, Expr)> {
        match self {
            Expr::Value(c) => Ok((c.type_of(), Expr::Value(c))),

            Expr::Var(name) => {
                let ty = env.borrow().resolve(&name)?;
                Ok((ty, Expr::Var(name)))
            }

            Expr::BinOp { op, lhs, rhs } => check_binop(op, *lhs, *rhs, env),

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => check_if(*cond, *then_branch, *else_branch, env),

            Expr::FunctionDecl {
                param,
                param_type,
                return_type,
                body,
            } => check_function_decl(param, param_type, return_type, body, env),

            Expr::FunctionApp { callee, arg } => check_function_app(*callee, *arg, env),

            Expr::Seq(exprs) => {
                let mut ty = Type::Unit;
                let mut checked = Vec::with_capacity(exprs.len());
                for e in exprs {
                    let (t, e) = e.typecheck(env)?;
                    ty = t;
                    checked.push(e);
                }
                Ok((ty, Expr::Seq(checked)))
            }

            Expr::Let {
                name,
                declared_type,
                value,
            } => {
                let (vt, value) = value.typecheck(env)?;
                let (bound, value) = match declared_type.clone() {
                    Some(declared) if declared == vt => (declared, value),
                    Some(declared) => {
                        if !vt.consistent_with(&declared) {
                            return Err(TypeError::mismatch(
                                format!("declaration of `{name}`"),
                                declared,
                                vt,
                            ));
                        }
                        let value = insert_cast("CLet", declared.clone(), value);
                        (declared, value)
                    }
                    None => (vt, value),
                };
                env.borrow_mut().create(name.clone(), bound)?;
                Ok((
                    Type::Unit,
                    Expr::Let {
                        name,
                        declared_type,
                        value: Box::new(value),
                    },
                ))
            }

            Expr::Assign { target, value } => check_assign(*target, *value, env),

            Expr::Deref(target) => {
                let (rt, target) = target.typecheck(env)?;
                match rt {
                    Type::Ref(cell) => Ok((*cell, Expr::deref(target))),
                    Type::Any => {
                        let target = insert_cast("CDeref1", Type::reference(Type::Any), target);
                        Ok((Type::Any, Expr::deref(target)))
                    }
                    found => Err(TypeError::NotAReference { found }),
                }
            }

            Expr::Ref { value, .. } => {
                let (vt, value) = value.typecheck(env)?;
                Ok((
                    Type::reference(vt.clone()),
                    Expr::Ref {
                        value: Box::new(value),
                        cell_type: Some(vt),
                    },
                ))
            }

            Expr::Print(arg) => {
                let (_, arg) = arg.typecheck(env)?;
                Ok((Type::Unit, Expr::print(arg)))
            }

            // The cast only schedules a runtime check; the body's static type is not refined.
            Expr::Cast { target, body } => {
                let (_, body) = body.typecheck(env)?;
                Ok((target.clone(), Expr::cast(target, body)))
            }
        }
    }
}

fn check_binop(op: BinOp, lhs: Expr, rhs: Expr, env: &TypeEnvRef) -> TypeResult<(Type, Expr)> {
    let (lt, lhs) = lhs.typecheck(env)?;
    let (rt, rhs) = rhs.typecheck(env)?;

    if op.is_equality() {
        if !lt.consistent_with(&rt) {
            return Err(TypeError::operator_mismatch(op, lt, rt));
        }
        return Ok((Type::Bool, Expr::binop(op, lhs, rhs)));
    }

    let lhs = int_operand(op, lt, lhs)?;
    let rhs = int_operand(op, rt, rhs)?;
    Ok((op.result_type(), Expr::binop(op, lhs, rhs)))
}

/// Integer operands pass through; dynamic ones get checked (CBinOp)
fn int_operand(op: BinOp, ty: Type, expr: Expr) -> TypeResult<Expr> {
    match ty {
        Type::Int => Ok(expr),
        Type::Any => Ok(insert_cast("CBinOp", Type::Int, expr)),
        found => Err(TypeError::operator_mismatch(op, Type::Int, found)),
    }
}

fn check_if(
    cond: Expr,
    then_branch: Expr,
    else_branch: Expr,
    env: &TypeEnvRef,
) -> TypeResult<(Type, Expr)> {
    let (ct, cond) = cond.typecheck(env)?;
    if !ct.consistent_with(&Type::Bool) {
        return Err(TypeError::mismatch("if condition", Type::Bool, ct));
    }
    let cond = if ct.is_any() {
        insert_cast("CIf1", Type::Bool, cond)
    } else {
        cond
    };

    // Only one branch runs, so a `let` in either binds only within it.
    let (tt, then_branch) = then_branch.typecheck(&child_env(env))?;
    let (et, else_branch) = else_branch.typecheck(&child_env(env))?;

    let supertype = tt.join(&et);
    let then_branch = if tt != supertype {
        insert_cast("CIf2", supertype.clone(), then_branch)
    } else {
        then_branch
    };
    let else_branch = if et != supertype {
        insert_cast("CIf3", supertype.clone(), else_branch)
    } else {
        else_branch
    };

    Ok((supertype, Expr::if_(cond, then_branch, else_branch)))
}

fn check_function_decl(
    param: String,
    param_type: Type,
    return_type: Option<Type>,
    body: Rc<Expr>,
    env: &TypeEnvRef,
) -> TypeResult<(Type, Expr)> {
    let inner = child_env(env);
    inner.borrow_mut().create(param.clone(), param_type.clone())?;
    let (body_type, body) = Rc::unwrap_or_clone(body).typecheck(&inner)?;

    let (return_type, body) = match return_type {
        None => (body_type, body),
        Some(declared) if declared == body_type => (declared, body),
        Some(declared) => {
            if !body_type.consistent_with(&declared) {
                return Err(TypeError::mismatch(
                    format!("body of function over `{param}`"),
                    declared,
                    body_type,
                ));
            }
            let body = insert_cast("CFun", declared.clone(), body);
            (declared, body)
        }
    };

    Ok((
        Type::closure(param_type.clone(), return_type.clone()),
        Expr::FunctionDecl {
            param,
            param_type,
            return_type: Some(return_type),
            body: Rc::new(body),
        },
    ))
}

fn check_function_app(callee: Expr, arg: Expr, env: &TypeEnvRef) -> TypeResult<(Type, Expr)> {
    let (ft, callee) = callee.typecheck(env)?;
    let (at, arg) = arg.typecheck(env)?;

    let (param_type, return_type, callee) = match ft {
        Type::Closure(param, ret) => (*param, *ret, callee),
        Type::Any => {
            let expected = Type::closure(at.clone(), Type::Any);
            (at.clone(), Type::Any, insert_cast("CApp1", expected, callee))
        }
        found => return Err(TypeError::NotAFunction { found }),
    };

    let arg = if param_type != at {
        if !param_type.consistent_with(&at) {
            return Err(TypeError::mismatch("function argument", param_type, at));
        }
        insert_cast("CApp2", param_type, arg)
    } else {
        arg
    };

    Ok((return_type, Expr::app(callee, arg)))
}

fn check_assign(target: Expr, value: Expr, env: &TypeEnvRef) -> TypeResult<(Type, Expr)> {
    let (rt, target) = target.typecheck(env)?;
    let (vt, value) = value.typecheck(env)?;

    let (cell_type, target) = match rt {
        Type::Ref(cell) => (*cell, target),
        Type::Any => {
            let target = insert_cast("CAssign1", Type::reference(vt.clone()), target);
            (vt.clone(), target)
        }
        found => return Err(TypeError::NotAReference { found }),
    };

    let value = if cell_type != vt {
        if !cell_type.consistent_with(&vt) {
            return Err(TypeError::mismatch("assignment", cell_type, vt));
        }
        insert_cast("CAssign2", cell_type.clone(), value)
    } else {
        value
    };

    Ok((Type::reference(cell_type), Expr::assign(target, value)))
}
