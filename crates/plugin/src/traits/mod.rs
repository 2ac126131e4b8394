//! Generator, input and output traits

pub mod generator;
pub mod output;

// Re-export main types for convenience
pub use generator::*;
pub use output::*;
