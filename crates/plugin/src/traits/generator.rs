//! Generator trait and option descriptors

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use crossplane_crd::KindRegistry;
use thiserror::Error;

use crate::context::GenerationContext;

/// A generator invoked once per run by the driver
#[async_trait]
pub trait Generator: Send + Sync {
    /// Name used on the command line, e.g. `xrd`
    fn name(&self) -> &str;

    /// One line description shown in the detailed help
    fn help(&self) -> &str;

    /// Options accepted as `<name>:<field>=<value>`
    fn option_fields(&self) -> Vec<OptionField>;

    /// Set one option. The value already has the kind declared for the field.
    fn set_option(&mut self, field: &str, value: OptionValue) -> Result<(), OptionValueError>;

    /// Register the document kinds this generator needs while loading sources
    fn register_kinds(&self, into: &mut KindRegistry);

    /// Generate output for the loaded packages
    async fn generate(&self, context: &GenerationContext) -> Result<()>;

    /// Clone the generator as a boxed trait object
    fn clone_box(&self) -> Box<dyn Generator>;
}

impl Clone for Box<dyn Generator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name())
            .finish()
    }
}

/// Type of an option value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    String,
    StringList,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::String => "string",
            FieldKind::StringList => "[]string",
        };
        f.pad(name)
    }
}

/// An option a generator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionField {
    /// Field name as written on the command line
    pub name: &'static str,

    /// Expected value type
    pub kind: FieldKind,

    /// Help text, including the default
    pub help: &'static str,
}

/// A parsed option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    String(String),
    StringList(Vec<String>),
}

impl OptionValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            OptionValue::Bool(_) => FieldKind::Bool,
            OptionValue::Int(_) => FieldKind::Int,
            OptionValue::String(_) => FieldKind::String,
            OptionValue::StringList(_) => FieldKind::StringList,
        }
    }

    pub fn into_bool(self) -> Result<bool, OptionValueError> {
        match self {
            OptionValue::Bool(value) => Ok(value),
            other => Err(OptionValueError::mismatch(FieldKind::Bool, &other)),
        }
    }

    pub fn into_int(self) -> Result<i64, OptionValueError> {
        match self {
            OptionValue::Int(value) => Ok(value),
            other => Err(OptionValueError::mismatch(FieldKind::Int, &other)),
        }
    }

    pub fn into_string(self) -> Result<String, OptionValueError> {
        match self {
            OptionValue::String(value) => Ok(value),
            other => Err(OptionValueError::mismatch(FieldKind::String, &other)),
        }
    }

    pub fn into_string_list(self) -> Result<Vec<String>, OptionValueError> {
        match self {
            OptionValue::StringList(value) => Ok(value),
            OptionValue::String(value) => Ok(vec![value]),
            other => Err(OptionValueError::mismatch(FieldKind::StringList, &other)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionValueError {
    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error("expected {expected}, got {found}")]
    Mismatch { expected: FieldKind, found: FieldKind },

    #[error("{0}")]
    Invalid(String),
}

impl OptionValueError {
    fn mismatch(expected: FieldKind, found: &OptionValue) -> Self {
        OptionValueError::Mismatch {
            expected,
            found: found.kind(),
        }
    }
}
