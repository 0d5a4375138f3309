//! Wrapping Rust closures as callable Wisp values.

use crate::error::Result;
use crate::value::{NativeFunction, Value};
use std::rc::Rc;

/// Builds a [`Value::Native`] from a name and a Rust closure. Used both by
/// the standard library (`stdlib.rs`) and by embedders calling
/// `add-native` through the `wisp` facade crate.
pub fn native_fn(name: impl Into<String>, func: impl Fn(&[Value]) -> Result<Value> + 'static) -> Value {
    Value::Native(Rc::new(NativeFunction { name: name.into(), func: Box::new(func) }))
}
