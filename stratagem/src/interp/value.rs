//! Runtime values for the interpreter

use crate::ast::{Constant, Expr};
use crate::env::ValueEnvRef;
use crate::types::Type;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// Immutable string
    Str(Rc<str>),
    /// Unit value
    Unit,
    /// Function value with its captured scope
    Closure(Rc<Closure>),
    /// Handle to a mutable cell; clones alias the same cell
    Ref(Rc<Reference>),
}

/// Closure: a function body plus the scope it was declared in
pub struct Closure {
    pub param: String,
    pub param_type: Type,
    pub return_type: Type,
    pub body: Rc<Expr>,
    /// Scope active at the declaration, shared by every call
    pub env: ValueEnvRef,
}

// The captured scope may contain this closure again; never print it.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("param", &self.param)
            .field("param_type", &self.param_type)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Mutable cell tagged with the static type it was allocated at
pub struct Reference {
    cell_type: Type,
    contents: RefCell<Value>,
}

impl Reference {
    pub fn new(cell_type: Type, value: Value) -> Self {
        Reference {
            cell_type,
            contents: RefCell::new(value),
        }
    }

    pub fn cell_type(&self) -> &Type {
        &self.cell_type
    }

    /// Current contents
    pub fn get(&self) -> Value {
        self.contents.borrow().clone()
    }

    /// Overwrite the contents in place
    pub fn set(&self, value: Value) {
        *self.contents.borrow_mut() = value;
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("cell_type", &self.cell_type)
            .finish_non_exhaustive()
    }
}

impl Value {
    /// Runtime type, as checked by casts
    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Str(_) => Type::String,
            Value::Unit => Type::Unit,
            Value::Closure(c) => Type::closure(c.param_type.clone(), c.return_type.clone()),
            Value::Ref(r) => Type::reference(r.cell_type.clone()),
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Unit => "()",
            Value::Closure(_) => "closure",
            Value::Ref(_) => "ref",
        }
    }

    /// Try to convert to i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to convert to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Constant> for Value {
    fn from(c: &Constant) -> Self {
        match c {
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(n) => Value::Int(*n),
            Constant::Str(s) => Value::Str(Rc::from(s.as_str())),
            Constant::Unit => Value::Unit,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Unit => write!(f, "()"),
            Value::Closure(c) => {
                write!(f, "fn({}: {}): {} {{...}}", c.param, c.param_type, c.return_type)
            }
            Value::Ref(r) => write!(f, "ref {}", r.get()),
        }
    }
}

// Primitives compare by content; closures and refs by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ValueEnvironment;

    fn closure(param_type: Type, return_type: Type) -> Value {
        Value::Closure(Rc::new(Closure {
            param: "x".to_string(),
            param_type,
            return_type,
            body: Rc::new(Expr::var("x")),
            env: ValueEnvironment::new().into_ref(),
        }))
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Str(Rc::from("hi"))), "hi");
        assert_eq!(format!("{}", Value::Unit), "()");
        assert_eq!(
            format!("{}", closure(Type::Int, Type::Any)),
            "fn(x: Int): ? {...}"
        );
        let r = Value::Ref(Rc::new(Reference::new(Type::Int, Value::Int(5))));
        assert_eq!(format!("{r}"), "ref 5");
    }

    #[test]
    fn test_runtime_types() {
        assert_eq!(Value::Int(1).type_of(), Type::Int);
        assert_eq!(Value::Str(Rc::from("")).type_of(), Type::String);
        assert_eq!(
            closure(Type::Int, Type::Bool).type_of(),
            Type::closure(Type::Int, Type::Bool)
        );
        let cell = Rc::new(Reference::new(Type::Any, Value::Int(5)));
        assert_eq!(cell.cell_type(), &Type::Any);
        assert_eq!(Value::Ref(cell).type_of(), Type::reference(Type::Any));
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Bool(true));
        assert_eq!(Value::Str(Rc::from("a")), Value::Str(Rc::from("a")));

        let f = closure(Type::Int, Type::Int);
        assert_eq!(f, f.clone());
        assert_ne!(f, closure(Type::Int, Type::Int));
    }

    #[test]
    fn test_ref_aliasing() {
        let cell = Rc::new(Reference::new(Type::Int, Value::Int(5)));
        let r1 = Value::Ref(Rc::clone(&cell));
        let r2 = r1.clone();
        if let Value::Ref(r) = &r2 {
            r.set(Value::Int(9));
        }
        assert_eq!(cell.get(), Value::Int(9));
        assert_eq!(r1, r2);

        let other = Value::Ref(Rc::new(Reference::new(Type::Int, Value::Int(9))));
        assert_ne!(r1, other);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Unit.as_int(), None);
        assert_eq!(Value::from(&Constant::Str("s".into())).as_str(), Some("s"));
        assert_eq!(Value::Unit.type_name(), "()");
    }
}
