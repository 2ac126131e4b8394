//! Command line option registry and token parsing

pub mod parse;
pub mod registry;


// Re-export main types for convenience
pub use parse::{OptionError, ParsedArguments};
pub use registry::{
    OptionArguments, OptionDefinition, OptionTarget, OptionsRegistry, OutputRuleKind,
};
