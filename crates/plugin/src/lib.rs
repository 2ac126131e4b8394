//! Generator driver infrastructure
//!
//! A [`Generator`] declares its options and the document kinds it needs,
//! then runs once per invocation against a [`GenerationContext`] that gives
//! it the loaded packages and the configured input and output rules.

pub mod context;
pub mod traits;

pub use context::{yaml_marshal, GenerationContext, Transform};
pub use traits::*;
