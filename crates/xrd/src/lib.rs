//! Crossplane CompositeResourceDefinition (XRD) types and the CRD to XRD mapping

pub mod convert;
pub mod types;

pub use convert::{crd_to_xrd, ensure_storage_version, has_storage_version, ConvertError};
pub use types::{
    CompositeResourceDefinition, CompositeResourceDefinitionSpec,
    CompositeResourceDefinitionStatus, CompositeResourceDefinitionVersion,
    CompositeResourceValidation,
};
