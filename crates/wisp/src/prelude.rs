//! Commonly imported names for embedders: `use wisp::prelude::*;`.

pub use crate::Wisp;
pub use wisp_runtime::{Error, InteractiveResult, Result, ScopeRef, Value};
