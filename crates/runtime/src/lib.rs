//! The Wisp runtime: scopes, values, the frame-stepping virtual machine,
//! its derived debug controls, and the standard library bound into every
//! fresh [`Vm`].
//!
//! This crate has no notion of files, terminals, or a host process — it
//! only knows how to load an [`Ast`](wisp_parser::Ast) and step through it.
//! The `wisp` crate builds the embedding surface on top of this one.

mod debug;
mod error;
mod eval;
mod frame;
mod interactive;
mod native;
mod scope;
mod stdlib;
mod value;
mod vm;

pub use error::{Error, Result, RuntimeError};
pub use interactive::InteractiveResult;
pub use native::native_fn;
pub use scope::ScopeRef;
pub use value::{
    ArrayRef, FunctionValue, NativeFunction, ObjectRef, ObjectValue, RangeValue, SetRef, TableRef, TypeDescriptor, Value,
};
pub use vm::Vm;
