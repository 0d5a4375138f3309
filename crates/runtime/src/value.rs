//! The tagged runtime value and its equality, ordering, truthiness, and
//! display rules.
//!
//! Arrays, tables, sets, and objects carry reference semantics: cloning a
//! `Value` clones the `Rc`, not the underlying container, so two bindings
//! can share and mutate the same data. Functions capture their defining
//! [`ScopeRef`] so closures keep working after the scope that created them
//! has gone out of lexical reach.

use crate::error::{Result, RuntimeError};
use crate::scope::ScopeRef;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use wisp_parser::AstIndex;

/// A mutable, reference-counted array.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
/// A mutable, reference-counted set. Backed by a `Vec` with linear-scan
/// dedup on insert: sets in Wisp scripts are small, and structural equality
/// on `Value` (which mixes ints/floats/containers) doesn't lend itself to a
/// `Hash` impl without losing the int/float cross-equality rule.
pub type SetRef = Rc<RefCell<Vec<Value>>>;
/// A mutable, reference-counted table, preserving insertion order so that
/// `keys`/`values` are deterministic.
pub type TableRef = Rc<RefCell<IndexMap<String, Value>>>;

/// A user-defined object: a type-name tag plus its fields.
#[derive(Clone)]
pub struct ObjectValue {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

/// A reference-counted, mutable object instance.
pub type ObjectRef = Rc<RefCell<ObjectValue>>;

/// A user-defined function value: its declaration plus the scope it closes over.
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<AstIndex>,
    /// The scope active when the `proc` statement executed; functions
    /// defined inside a loop body capture that iteration's scope, so two
    /// closures created in different iterations see different bindings.
    pub captured_scope: ScopeRef,
}

/// A host-provided callable, registered via the embedding surface.
pub struct NativeFunction {
    pub name: String,
    #[allow(clippy::type_complexity)]
    pub func: Box<dyn Fn(&[Value]) -> Result<Value>>,
}

/// A type descriptor: a type name plus its ordered field list, callable as
/// a constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub fields: Vec<String>,
}

/// An integer range, inclusive or exclusive of its upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub inclusive: bool,
}

impl RangeValue {
    /// Materialises the range into its integer members, in order.
    pub fn to_vec(self) -> Vec<i64> {
        if self.inclusive {
            if self.start <= self.end {
                (self.start..=self.end).collect()
            } else {
                (self.end..=self.start).rev().collect()
            }
        } else if self.start <= self.end {
            (self.start..self.end).collect()
        } else {
            ((self.end + 1)..=self.start).rev().collect()
        }
    }
}

/// The tagged runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(ArrayRef),
    Set(SetRef),
    Table(TableRef),
    Object(ObjectRef),
    Function(Rc<FunctionValue>),
    Native(Rc<NativeFunction>),
    Type(Rc<TypeDescriptor>),
    Range(RangeValue),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn set(items: Vec<Value>) -> Self {
        let mut deduped: Vec<Value> = Vec::new();
        for item in items {
            if !deduped.iter().any(|existing| existing.equals(&item)) {
                deduped.push(item);
            }
        }
        Value::Set(Rc::new(RefCell::new(deduped)))
    }

    pub fn table(entries: Vec<(String, Value)>) -> Self {
        let mut map = IndexMap::new();
        for (k, v) in entries {
            map.insert(k, v);
        }
        Value::Table(Rc::new(RefCell::new(map)))
    }

    /// The type name as used by `typeof` and in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Table(_) => "table",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Native(_) => "native function",
            Value::Type(_) => "type",
            Value::Range(_) => "range",
        }
    }

    /// Truthiness used by `if`/`while`/`and`/`or`: everything is truthy
    /// except `nil` and `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Structural equality, with int/float cross-comparison.
    pub fn equals(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => *a as f64 == *b,
            (Str(a), Str(b)) => a == b,
            (Array(a), Array(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Set(a), Set(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.equals(y)))
            }
            (Table(a), Table(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| v.equals(bv)))
            }
            (Object(a), Object(b)) => Rc::ptr_eq(a, b),
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Native(a), Native(b)) => Rc::ptr_eq(a, b),
            (Type(a), Type(b)) => a == b,
            (Range(a), Range(b)) => a == b,
            _ => false,
        }
    }

    /// A value is hashable/immutable-comparable if it's not a mutable
    /// container; used when values are stored in a set.
    pub fn is_hashable(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Table(_) | Value::Set(_) | Value::Object(_))
    }

    /// Ordering for `< <= > >=`, defined for int, float, int/float mixes, and string.
    pub fn compare(&self, other: &Value, line: u32, column: u32) -> Result<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Ok(a.cmp(b)),
            (Float(a), Float(b)) => {
                a.partial_cmp(b).ok_or_else(|| RuntimeError::new("Cannot compare NaN", line, column).into())
            }
            (Int(a), Float(b)) => (*a as f64)
                .partial_cmp(b)
                .ok_or_else(|| RuntimeError::new("Cannot compare NaN", line, column).into()),
            (Float(a), Int(b)) => a
                .partial_cmp(&(*b as f64))
                .ok_or_else(|| RuntimeError::new("Cannot compare NaN", line, column).into()),
            (Str(a), Str(b)) => Ok(a.cmp(b)),
            _ => Err(RuntimeError::new(
                format!("Cannot compare {} and {}", self.type_name(), other.type_name()),
                line,
                column,
            )
            .into()),
        }
    }

    /// Textual rendering, used by `echo`, `$`, and string concatenation.
    pub fn display_string(&self) -> String {
        format!("{self}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "set{{")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Value::Table(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => {
                let obj = obj.borrow();
                write!(f, "{}(", obj.type_name)?;
                for (i, (k, v)) in obj.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, ")")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Native(func) => write!(f, "<native function {}>", func.name),
            Value::Type(ty) => write!(f, "<type {}>", ty.name),
            Value::Range(r) => {
                if r.inclusive {
                    write!(f, "{}..{}", r.start, r.end)
                } else {
                    write!(f, "{}..<{}", r.start, r.end)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_float_cross_equality() {
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert!(!Value::Int(2).equals(&Value::Float(2.1)));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
    }

    #[test]
    fn set_construction_dedups_structurally() {
        let set = Value::set(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        let Value::Set(items) = set else { panic!() };
        assert_eq!(items.borrow().len(), 2);
    }

    #[test]
    fn array_reference_semantics() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = a.clone();
        if let Value::Array(items) = &a {
            items.borrow_mut().push(Value::Int(2));
        }
        if let Value::Array(items) = &b {
            assert_eq!(items.borrow().len(), 2);
        }
    }

    #[test]
    fn range_materialisation() {
        let inclusive = RangeValue { start: 1, end: 3, inclusive: true };
        assert_eq!(inclusive.to_vec(), vec![1, 2, 3]);
        let exclusive = RangeValue { start: 1, end: 3, inclusive: false };
        assert_eq!(exclusive.to_vec(), vec![1, 2]);
    }

    #[test]
    fn display_renders_array() {
        let v = Value::array(vec![Value::Int(1), Value::Str("x".into())]);
        assert_eq!(v.display_string(), "[1, x]");
    }
}
