//! The built-in function library (§6.3): a fixed set of native functions
//! bound into every VM's global scope before a script runs. Each one is a
//! thin wrapper around the same equality/ordering/display rules `Value`
//! already implements, so the library never duplicates core semantics.

use crate::error::RuntimeError;
use crate::native::native_fn;
use crate::scope::ScopeRef;
use crate::value::Value;

/// Binds every standard library function into `scope`. Called once, on a
/// freshly constructed global scope, before `Vm::load`.
pub(crate) fn install(scope: &ScopeRef) {
    for (name, value) in builtins() {
        scope.define(name, value, true);
    }
}

fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        ("len", native_fn("len", len)),
        ("str", native_fn("str", str_fn)),
        ("int", native_fn("int", int_fn)),
        ("float", native_fn("float", float_fn)),
        ("typeof", native_fn("typeof", typeof_fn)),
        ("push", native_fn("push", push)),
        ("pop", native_fn("pop", pop)),
        ("keys", native_fn("keys", keys)),
        ("values", native_fn("values", values)),
        ("hasKey", native_fn("hasKey", has_key)),
        ("abs", native_fn("abs", abs)),
        ("min", native_fn("min", min)),
        ("max", native_fn("max", max)),
        ("contains", native_fn("contains", contains)),
        ("incl", native_fn("incl", incl)),
        ("excl", native_fn("excl", excl)),
        ("card", native_fn("card", card)),
        ("del", native_fn("del", del)),
    ]
}

fn arity(args: &[Value], expected: usize) -> crate::error::Result<()> {
    if args.len() != expected {
        return Err(RuntimeError::arity_mismatch(expected, args.len(), 0, 0).into());
    }
    Ok(())
}

fn type_error(name: &str, got: &Value) -> crate::error::Error {
    RuntimeError::new(format!("{name} does not accept a {}", got.type_name()), 0, 0).into()
}

fn len(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    let n = match &args[0] {
        Value::Array(items) => items.borrow().len(),
        Value::Set(items) => items.borrow().len(),
        Value::Str(s) => s.chars().count(),
        Value::Table(entries) => entries.borrow().len(),
        other => return Err(type_error("len", other)),
    };
    Ok(Value::Int(n as i64))
}

fn str_fn(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    Ok(Value::str(args[0].display_string()))
}

fn int_fn(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    let n = match &args[0] {
        Value::Int(n) => *n,
        Value::Float(n) => *n as i64,
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| RuntimeError::new(format!("Cannot parse '{s}' as an int"), 0, 0))?,
        other => return Err(type_error("int", other)),
    };
    Ok(Value::Int(n))
}

fn float_fn(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    let n = match &args[0] {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RuntimeError::new(format!("Cannot parse '{s}' as a float"), 0, 0))?,
        other => return Err(type_error("float", other)),
    };
    Ok(Value::Float(n))
}

fn typeof_fn(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    Ok(Value::str(args[0].type_name()))
}

fn push(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    match &args[0] {
        Value::Array(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(Value::Nil)
        }
        other => Err(type_error("push", other)),
    }
}

fn pop(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    match &args[0] {
        Value::Array(items) => items
            .borrow_mut()
            .pop()
            .ok_or_else(|| RuntimeError::new("Cannot pop from an empty array", 0, 0).into()),
        other => Err(type_error("pop", other)),
    }
}

fn keys(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    match &args[0] {
        Value::Table(entries) => Ok(Value::array(entries.borrow().keys().map(|k| Value::str(k.as_str())).collect())),
        other => Err(type_error("keys", other)),
    }
}

fn values(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    match &args[0] {
        Value::Table(entries) => Ok(Value::array(entries.borrow().values().cloned().collect())),
        other => Err(type_error("values", other)),
    }
}

fn has_key(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Table(entries), Value::Str(key)) => Ok(Value::Bool(entries.borrow().contains_key(key.as_ref()))),
        (other, Value::Str(_)) => Err(type_error("hasKey", other)),
        (_, other) => Err(RuntimeError::new(format!("hasKey expects a string key, got {}", other.type_name()), 0, 0).into()),
    }
}

fn abs(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
        Value::Float(n) => Ok(Value::Float(n.abs())),
        other => Err(type_error("abs", other)),
    }
}

fn min(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    pairwise(&args[0], &args[1], std::cmp::Ordering::Less)
}

fn max(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    pairwise(&args[0], &args[1], std::cmp::Ordering::Greater)
}

fn pairwise(a: &Value, b: &Value, keep: std::cmp::Ordering) -> crate::error::Result<Value> {
    let ordering = a.compare(b, 0, 0)?;
    if ordering == keep {
        Ok(a.clone())
    } else {
        Ok(b.clone())
    }
}

fn contains(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    let found = match &args[0] {
        Value::Array(items) => items.borrow().iter().any(|v| v.equals(&args[1])),
        Value::Set(items) => items.borrow().iter().any(|v| v.equals(&args[1])),
        Value::Table(entries) => match &args[1] {
            Value::Str(key) => entries.borrow().contains_key(key.as_ref()),
            _ => false,
        },
        Value::Str(s) => match &args[1] {
            Value::Str(needle) => s.contains(needle.as_ref()),
            _ => false,
        },
        other => return Err(type_error("contains", other)),
    };
    Ok(Value::Bool(found))
}

fn incl(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    match &args[0] {
        Value::Set(items) => {
            let mut items = items.borrow_mut();
            if !items.iter().any(|v| v.equals(&args[1])) {
                items.push(args[1].clone());
            }
            Ok(Value::Nil)
        }
        other => Err(type_error("incl", other)),
    }
}

fn excl(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    match &args[0] {
        Value::Set(items) => {
            items.borrow_mut().retain(|v| !v.equals(&args[1]));
            Ok(Value::Nil)
        }
        other => Err(type_error("excl", other)),
    }
}

fn card(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 1)?;
    match &args[0] {
        Value::Set(items) => Ok(Value::Int(items.borrow().len() as i64)),
        other => Err(type_error("card", other)),
    }
}

fn del(args: &[Value]) -> crate::error::Result<Value> {
    arity(args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Table(entries), Value::Str(key)) => {
            entries.borrow_mut().shift_remove(key.as_ref());
            Ok(Value::Nil)
        }
        (other, Value::Str(_)) => Err(type_error("del", other)),
        (_, other) => Err(RuntimeError::new(format!("del expects a string key, got {}", other.type_name()), 0, 0).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeRef;

    fn bound() -> ScopeRef {
        let scope = ScopeRef::new_global();
        install(&scope);
        scope
    }

    #[test]
    fn len_counts_array_string_table() {
        let scope = bound();
        let Some(Value::Native(len)) = scope.lookup("len") else { panic!() };
        assert!(matches!((len.func)(&[Value::array(vec![Value::Int(1), Value::Int(2)])]), Ok(Value::Int(2))));
        assert!(matches!((len.func)(&[Value::str("hi")]), Ok(Value::Int(2))));
    }

    #[test]
    fn push_pop_round_trip() {
        let scope = bound();
        let Some(Value::Native(push_fn)) = scope.lookup("push") else { panic!() };
        let Some(Value::Native(pop_fn)) = scope.lookup("pop") else { panic!() };
        let arr = Value::array(vec![Value::Int(1)]);
        (push_fn.func)(&[arr.clone(), Value::Int(2)]).unwrap();
        let Value::Array(items) = &arr else { panic!() };
        assert_eq!(items.borrow().len(), 2);
        let popped = (pop_fn.func)(&[arr.clone()]).unwrap();
        assert!(matches!(popped, Value::Int(2)));
    }

    #[test]
    fn pop_empty_array_errors() {
        let scope = bound();
        let Some(Value::Native(pop_fn)) = scope.lookup("pop") else { panic!() };
        assert!((pop_fn.func)(&[Value::array(vec![])]).is_err());
    }

    #[test]
    fn set_incl_excl_card() {
        let scope = bound();
        let Some(Value::Native(incl_fn)) = scope.lookup("incl") else { panic!() };
        let Some(Value::Native(excl_fn)) = scope.lookup("excl") else { panic!() };
        let Some(Value::Native(card_fn)) = scope.lookup("card") else { panic!() };
        let set = Value::set(vec![Value::Int(1)]);
        (incl_fn.func)(&[set.clone(), Value::Int(2)]).unwrap();
        assert!(matches!((card_fn.func)(&[set.clone()]), Ok(Value::Int(2))));
        (excl_fn.func)(&[set.clone(), Value::Int(1)]).unwrap();
        assert!(matches!((card_fn.func)(&[set.clone()]), Ok(Value::Int(1))));
    }

    #[test]
    fn min_max_use_compare_rules() {
        let scope = bound();
        let Some(Value::Native(min_fn)) = scope.lookup("min") else { panic!() };
        let Some(Value::Native(max_fn)) = scope.lookup("max") else { panic!() };
        assert!(matches!((min_fn.func)(&[Value::Int(3), Value::Float(1.5)]), Ok(Value::Float(f)) if f == 1.5));
        assert!(matches!((max_fn.func)(&[Value::Int(3), Value::Float(1.5)]), Ok(Value::Int(3))));
    }

    #[test]
    fn has_key_and_del() {
        let scope = bound();
        let Some(Value::Native(has_key_fn)) = scope.lookup("hasKey") else { panic!() };
        let Some(Value::Native(del_fn)) = scope.lookup("del") else { panic!() };
        let table = Value::table(vec![("a".into(), Value::Int(1))]);
        assert!(matches!((has_key_fn.func)(&[table.clone(), Value::str("a")]), Ok(Value::Bool(true))));
        (del_fn.func)(&[table.clone(), Value::str("a")]).unwrap();
        assert!(matches!((has_key_fn.func)(&[table.clone(), Value::str("a")]), Ok(Value::Bool(false))));
    }
}
