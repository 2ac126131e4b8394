//! CRD (CustomResourceDefinition) collection and parsing
//!
//! Sources are either CRD manifests on disk ([`loader`]) or Rust types
//! deriving `kube::CustomResource` ([`collector`]). Both end up as
//! [`Package`]s that the [`Parser`] turns into one CRD per API kind.

pub mod collector;
pub mod error;
pub mod loader;
pub mod parser;
pub mod schema;

pub use collector::TypeCollector;
pub use error::Error;
pub use loader::{load_roots, Document, KindRegistry, Package};
pub use parser::{GroupKind, Parser, ParserOptions};

/// API version of the documents the parser consumes
pub const CRD_API_VERSION: &str = "apiextensions.k8s.io/v1";

/// Kind of the documents the parser consumes
pub const CRD_KIND: &str = "CustomResourceDefinition";

/// Register the document kinds the parser needs recognized while loading sources
pub fn register_kinds(into: &mut KindRegistry) {
    into.register(CRD_API_VERSION, CRD_KIND);
}
