//! Expression evaluator

use super::error::{InterpResult, RuntimeError};
use super::value::{Closure, Reference, Value};
use super::InterpreterConfig;
use crate::ast::{BinOp, Expr};
use crate::env::{child_env, ValueEnvRef, ValueEnvironment};
use std::io::{self, Write};
use std::rc::Rc;

/// The interpreter
///
/// Evaluates trees that have already been through `TypeChecker::check`;
/// the casts inserted there are what keep the static types honest.
pub struct Interpreter<W: Write = io::Stdout> {
    /// Global environment
    global_env: ValueEnvRef,
    /// Sink for `print`
    output: W,
    config: InterpreterConfig,
    /// Current closure call depth
    call_depth: usize,
}

impl Interpreter<io::Stdout> {
    /// Create a new interpreter that prints to stdout
    pub fn new() -> Self {
        Interpreter::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Create a new interpreter that prints to `output`
    pub fn with_output(output: W) -> Self {
        Interpreter {
            global_env: ValueEnvironment::new().into_ref(),
            output,
            config: InterpreterConfig::default(),
            call_depth: 0,
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn global_env(&self) -> &ValueEnvRef {
        &self.global_env
    }

    /// Printed output so far
    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Bind a host-provided global before running
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> InterpResult<()> {
        self.global_env.borrow_mut().create(name, value)?;
        Ok(())
    }

    /// Evaluate a whole program in the global environment
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, expr: &Expr) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        let result = self.evaluate(expr, &env);
        if let Err(err) = &result {
            tracing::debug!(kind = ?err.kind, fatal = err.is_fatal(), "evaluation failed");
        }
        result
    }

    /// Evaluate an expression with automatic stack growth for deep recursion
    pub fn evaluate(&mut self, expr: &Expr, env: &ValueEnvRef) -> InterpResult<Value> {
        let InterpreterConfig {
            stack_red_zone,
            stack_grow_size,
            ..
        } = self.config;
        stacker::maybe_grow(stack_red_zone, stack_grow_size, || self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Expr, env: &ValueEnvRef) -> InterpResult<Value> {
        match expr {
            Expr::Value(c) => Ok(Value::from(c)),

            Expr::Var(name) => Ok(env.borrow().resolve(name)?),

            Expr::BinOp { op, lhs, rhs } => {
                let lval = self.evaluate(lhs, env)?;
                let rval = self.evaluate(rhs, env)?;
                eval_binary(*op, lval, rval)
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => match self.evaluate(cond, env)? {
                Value::Bool(true) => self.evaluate(then_branch, &child_env(env)),
                Value::Bool(false) => self.evaluate(else_branch, &child_env(env)),
                other => Err(RuntimeError::internal("bool condition", &other)),
            },

            Expr::FunctionDecl {
                param,
                param_type,
                return_type,
                body,
            } => {
                let return_type = return_type
                    .clone()
                    .ok_or_else(|| RuntimeError::not_typechecked("function declaration"))?;
                Ok(Value::Closure(Rc::new(Closure {
                    param: param.clone(),
                    param_type: param_type.clone(),
                    return_type,
                    body: Rc::clone(body),
                    env: Rc::clone(env),
                })))
            }

            Expr::FunctionApp { callee, arg } => {
                let closure = match self.evaluate(callee, env)? {
                    Value::Closure(c) => c,
                    other => return Err(RuntimeError::internal("closure", &other)),
                };
                let arg = self.evaluate(arg, env)?;
                self.call_closure(&closure, arg)
            }

            Expr::Seq(exprs) => {
                let mut result = Value::Unit;
                for e in exprs {
                    result = self.evaluate(e, env)?;
                }
                Ok(result)
            }

            Expr::Let { name, value, .. } => {
                let value = self.evaluate(value, env)?;
                env.borrow_mut().create(name.clone(), value)?;
                Ok(Value::Unit)
            }

            Expr::Assign { target, value } => {
                let cell = self.eval_reference(target, env)?;
                let value = self.evaluate(value, env)?;
                cell.set(value);
                Ok(Value::Ref(cell))
            }

            Expr::Deref(target) => Ok(self.eval_reference(target, env)?.get()),

            Expr::Ref { value, cell_type } => {
                let cell_type = cell_type
                    .clone()
                    .ok_or_else(|| RuntimeError::not_typechecked("reference allocation"))?;
                let value = self.evaluate(value, env)?;
                Ok(Value::Ref(Rc::new(Reference::new(cell_type, value))))
            }

            Expr::Print(arg) => {
                let value = self.evaluate(arg, env)?;
                writeln!(self.output, "{value}").map_err(|e| RuntimeError::io_error(&e))?;
                Ok(Value::Unit)
            }

            Expr::Cast { target, body } => {
                let value = self.evaluate(body, env)?;
                let actual = value.type_of();
                if actual.consistent_with(target) {
                    Ok(value)
                } else {
                    tracing::debug!(%actual, %target, "cast failed");
                    Err(RuntimeError::cast_failed(&value, &actual, target))
                }
            }
        }
    }

    fn eval_reference(&mut self, target: &Expr, env: &ValueEnvRef) -> InterpResult<Rc<Reference>> {
        match self.evaluate(target, env)? {
            Value::Ref(cell) => Ok(cell),
            other => Err(RuntimeError::internal("reference", &other)),
        }
    }

    /// Call a closure in a fresh scope chained to its captured environment
    fn call_closure(&mut self, closure: &Closure, arg: Value) -> InterpResult<Value> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::stack_overflow(self.config.max_call_depth));
        }
        tracing::trace!(param = %closure.param, depth = self.call_depth, "calling closure");

        let frame = child_env(&closure.env);
        frame.borrow_mut().create(closure.param.clone(), arg)?;

        self.call_depth += 1;
        let result = self.evaluate(&closure.body, &frame);
        self.call_depth -= 1;
        result
    }
}

/// Apply a binary operator to evaluated operands
fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> InterpResult<Value> {
    let result = match op {
        BinOp::Eq => Value::Bool(lhs == rhs),
        BinOp::Ne => Value::Bool(lhs != rhs),
        BinOp::Add => {
            let (a, b) = int_operands(&lhs, &rhs)?;
            Value::Int(a.wrapping_add(b))
        }
        BinOp::Sub => {
            let (a, b) = int_operands(&lhs, &rhs)?;
            Value::Int(a.wrapping_sub(b))
        }
        BinOp::Mul => {
            let (a, b) = int_operands(&lhs, &rhs)?;
            Value::Int(a.wrapping_mul(b))
        }
        BinOp::Div => {
            let (a, b) = int_operands(&lhs, &rhs)?;
            if b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Int(a.wrapping_div(b))
        }
        BinOp::Mod => {
            let (a, b) = int_operands(&lhs, &rhs)?;
            if b == 0 {
                return Err(RuntimeError::division_by_zero());
            }
            Value::Int(a.wrapping_rem(b))
        }
        BinOp::Gt => compare(&lhs, &rhs, |a, b| a > b)?,
        BinOp::Ge => compare(&lhs, &rhs, |a, b| a >= b)?,
        BinOp::Lt => compare(&lhs, &rhs, |a, b| a < b)?,
        BinOp::Le => compare(&lhs, &rhs, |a, b| a <= b)?,
    };
    Ok(result)
}

/// Both operands of an integer operator, already cast by the checker
fn int_operands(lhs: &Value, rhs: &Value) -> InterpResult<(i64, i64)> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        (Value::Int(_), other) | (other, _) => Err(RuntimeError::internal("int operand", other)),
    }
}

fn compare(lhs: &Value, rhs: &Value, cmp: fn(i64, i64) -> bool) -> InterpResult<Value> {
    let (a, b) = int_operands(lhs, rhs)?;
    Ok(Value::Bool(cmp(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;
    use crate::types::{Type, TypeChecker};

    fn interp() -> Interpreter<Vec<u8>> {
        Interpreter::with_output(Vec::new())
    }

    /// Type check, then evaluate in a fresh interpreter
    fn eval(expr: Expr) -> InterpResult<Value> {
        let (_, expr) = TypeChecker::new().check(expr).unwrap();
        interp().run(&expr)
    }

    /// `fn(x: ?): ? { x }(value)`: the value, statically typed `?`
    fn make_any(value: Expr) -> Expr {
        Expr::app(Expr::func("x", Type::Any, Some(Type::Any), Expr::var("x")), value)
    }

    #[test]
    fn test_eval_literals() {
        assert_eq!(eval(Expr::int(42)).unwrap(), Value::Int(42));
        assert_eq!(eval(Expr::bool(true)).unwrap(), Value::Bool(true));
        assert_eq!(eval(Expr::str("s")).unwrap().as_str(), Some("s"));
        assert_eq!(eval(Expr::unit()).unwrap(), Value::Unit);
    }

    #[test]
    fn test_eval_binary() {
        let add = Expr::binop(BinOp::Add, Expr::int(2), Expr::int(3));
        assert_eq!(eval(add).unwrap(), Value::Int(5));

        let rem = Expr::binop(BinOp::Mod, Expr::int(7), Expr::int(3));
        assert_eq!(eval(rem).unwrap(), Value::Int(1));

        let lt = Expr::binop(BinOp::Lt, Expr::int(2), Expr::int(3));
        assert_eq!(eval(lt).unwrap(), Value::Bool(true));

        let ne = Expr::binop(BinOp::Ne, Expr::str("a"), Expr::str("a"));
        assert_eq!(eval(ne).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_equality_across_dynamic_types() {
        let eq = Expr::binop(BinOp::Eq, make_any(Expr::int(1)), Expr::bool(true));
        assert_eq!(eval(eq).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_division_by_zero() {
        let div = Expr::binop(BinOp::Div, Expr::int(10), Expr::int(0));
        let err = eval(div).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_arithmetic_wraps() {
        let add = Expr::binop(BinOp::Add, Expr::int(i64::MAX), Expr::int(1));
        assert_eq!(eval(add).unwrap(), Value::Int(i64::MIN));
    }

    #[test]
    fn test_eval_if() {
        let e = Expr::if_(Expr::bool(false), Expr::int(1), Expr::int(2));
        assert_eq!(eval(e).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_dynamic_operand_cast_fails() {
        let e = Expr::binop(BinOp::Add, make_any(Expr::bool(true)), Expr::int(1));
        let err = eval(e).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cast);
    }

    #[test]
    fn test_dynamic_condition_cast() {
        let ok = Expr::if_(make_any(Expr::bool(true)), Expr::int(1), Expr::int(2));
        assert_eq!(eval(ok).unwrap(), Value::Int(1));

        let bad = Expr::if_(make_any(Expr::int(0)), Expr::int(1), Expr::int(2));
        assert_eq!(eval(bad).unwrap_err().kind, ErrorKind::Cast);
    }

    #[test]
    fn test_unchecked_if_is_internal() {
        let e = Expr::if_(Expr::int(0), Expr::int(1), Expr::int(2));
        let err = interp().run(&e).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unchecked_function_is_rejected() {
        let f = Expr::func("x", Type::Int, None, Expr::var("x"));
        let err = interp().run(&f).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotTypechecked);

        let r = Expr::new_ref(Expr::int(1));
        assert_eq!(interp().run(&r).unwrap_err().kind, ErrorKind::NotTypechecked);
    }

    #[test]
    fn test_id_function() {
        let app = Expr::app(Expr::func("x", Type::Int, None, Expr::var("x")), Expr::int(321));
        assert_eq!(eval(app).unwrap(), Value::Int(321));
    }

    #[test]
    fn test_closure_captures_declaring_scope() {
        // fn(name: String) { fn(unused: String) { name }("Bob") }("Alice")
        let inner = Expr::func("unused", Type::String, None, Expr::var("name"));
        let outer = Expr::func("name", Type::String, None, Expr::app(inner, Expr::str("Bob")));
        let v = eval(Expr::app(outer, Expr::str("Alice"))).unwrap();
        assert_eq!(v.as_str(), Some("Alice"));
    }

    #[test]
    fn test_inner_parameter_shadows() {
        // fn(name: String) { fn(name: String) { name }("Bob"); name }("Alice")
        let inner = Expr::func("name", Type::String, None, Expr::var("name"));
        let body = Expr::seq(vec![Expr::app(inner, Expr::str("Bob")), Expr::var("name")]);
        let outer = Expr::func("name", Type::String, None, body);
        let v = eval(Expr::app(outer, Expr::str("Alice"))).unwrap();
        assert_eq!(v.as_str(), Some("Alice"));
    }

    #[test]
    fn test_curried_closure() {
        // let add = fn(a: Int) { fn(b: Int) { a + b } }; add(2)(40)
        let add = Expr::func(
            "a",
            Type::Int,
            None,
            Expr::func(
                "b",
                Type::Int,
                None,
                Expr::binop(BinOp::Add, Expr::var("a"), Expr::var("b")),
            ),
        );
        let prog = Expr::seq(vec![
            Expr::let_("add", None, add),
            Expr::app(Expr::app(Expr::var("add"), Expr::int(2)), Expr::int(40)),
        ]);
        assert_eq!(eval(prog).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_seq_and_let() {
        let prog = Expr::seq(vec![
            Expr::let_("x", None, Expr::int(2)),
            Expr::binop(BinOp::Mul, Expr::var("x"), Expr::int(3)),
        ]);
        assert_eq!(eval(prog).unwrap(), Value::Int(6));
        assert_eq!(eval(Expr::seq(vec![])).unwrap(), Value::Unit);
    }

    #[test]
    fn test_let_in_branch_is_scoped() {
        // { if true { let x = 1 } else { () }; let x = 2; x }
        let prog = Expr::seq(vec![
            Expr::if_(
                Expr::bool(true),
                Expr::let_("x", None, Expr::int(1)),
                Expr::unit(),
            ),
            Expr::let_("x", None, Expr::int(2)),
            Expr::var("x"),
        ]);
        let (_, prog) = TypeChecker::new().check(prog).unwrap();
        let mut interp = interp();
        assert_eq!(interp.run(&prog).unwrap(), Value::Int(2));
        assert_eq!(interp.global_env().borrow().resolve("x"), Ok(Value::Int(2)));
    }

    #[test]
    fn test_assign_returns_ref() {
        let prog = Expr::seq(vec![
            Expr::let_("r", None, Expr::new_ref(Expr::int(5))),
            Expr::deref(Expr::assign(Expr::var("r"), Expr::int(7))),
        ]);
        assert_eq!(eval(prog).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_counter_closure_over_ref() {
        // let c = ref 0; let bump = fn(u: ()) { c := !c + 1; !c }; bump(()); bump(())
        let bump = Expr::func(
            "u",
            Type::Unit,
            None,
            Expr::seq(vec![
                Expr::assign(
                    Expr::var("c"),
                    Expr::binop(BinOp::Add, Expr::deref(Expr::var("c")), Expr::int(1)),
                ),
                Expr::deref(Expr::var("c")),
            ]),
        );
        let prog = Expr::seq(vec![
            Expr::let_("c", None, Expr::new_ref(Expr::int(0))),
            Expr::let_("bump", None, bump),
            Expr::app(Expr::var("bump"), Expr::unit()),
            Expr::app(Expr::var("bump"), Expr::unit()),
        ]);
        assert_eq!(eval(prog).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_print_writes_output() {
        let prog = Expr::seq(vec![
            Expr::print(Expr::str("hello")),
            Expr::print(Expr::binop(BinOp::Add, Expr::int(1), Expr::int(2))),
        ]);
        let (_, prog) = TypeChecker::new().check(prog).unwrap();
        let mut interp = interp();
        assert_eq!(interp.run(&prog).unwrap(), Value::Unit);
        assert_eq!(interp.output().as_slice(), b"hello\n3\n");
        assert_eq!(String::from_utf8(interp.into_output()).unwrap(), "hello\n3\n");
    }

    #[test]
    fn test_call_depth_limit() {
        // Landin's knot: a ref cell holding a closure that calls itself through the cell.
        let body = Expr::app(Expr::deref(Expr::var("self")), Expr::var("n"));
        let looping = Expr::func("n", Type::Int, Some(Type::Int), body);
        let placeholder = Expr::func("n", Type::Int, Some(Type::Int), Expr::var("n"));
        let prog = Expr::seq(vec![
            Expr::let_("self", None, Expr::new_ref(placeholder)),
            Expr::assign(Expr::var("self"), looping),
            Expr::app(Expr::deref(Expr::var("self")), Expr::int(1)),
        ]);
        let (_, prog) = TypeChecker::new().check(prog).unwrap();
        let config = InterpreterConfig {
            max_call_depth: 50,
            ..InterpreterConfig::default()
        };
        let mut interp = interp().with_config(config);
        assert_eq!(interp.config().max_call_depth, 50);
        let err = interp.run(&prog).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow);
    }

    #[test]
    fn test_host_defined_global() {
        let mut interp = interp();
        interp.define("answer", Value::Int(42)).unwrap();
        assert!(interp.global_env().borrow().contains_local("answer"));
        assert_eq!(interp.run(&Expr::var("answer")).unwrap(), Value::Int(42));
        assert_eq!(
            interp.define("answer", Value::Unit).unwrap_err().kind,
            ErrorKind::Redeclaration
        );
        assert_eq!(interp.run(&Expr::var("missing")).unwrap_err().kind, ErrorKind::UnboundName);
    }
}
