//! XRD types for `apiextensions.crossplane.io/v2`

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceColumnDefinition, CustomResourceConversion, CustomResourceDefinitionNames,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, ObjectMeta};
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde::{Deserialize, Serialize};

/// API version of generated XRDs
pub const API_VERSION: &str = "apiextensions.crossplane.io/v2";

/// Kind of generated XRDs
pub const KIND: &str = "CompositeResourceDefinition";

/// A Crossplane CompositeResourceDefinition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinition {
    /// Always `apiextensions.crossplane.io/v2`
    pub api_version: String,

    /// Always `CompositeResourceDefinition`
    pub kind: String,

    /// Object metadata
    pub metadata: ObjectMeta,

    /// Desired state
    pub spec: CompositeResourceDefinitionSpec,

    /// Observed state, set by the Crossplane control plane only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CompositeResourceDefinitionStatus>,
}

impl CompositeResourceDefinition {
    /// Create an XRD with the v2 type information filled in
    pub fn new(metadata: ObjectMeta, spec: CompositeResourceDefinitionSpec) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata,
            spec,
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinitionSpec {
    /// API group of the defined composite resource
    pub group: String,

    /// Names of the defined composite resource
    pub names: CustomResourceDefinitionNames,

    /// All versions of the defined composite resource, in declaration order
    pub versions: Vec<CompositeResourceDefinitionVersion>,

    /// Conversion strategy between versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<CustomResourceConversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinitionVersion {
    /// Version name, e.g. `v1alpha1`
    pub name: String,

    /// Whether composition and claims may reference this version.
    /// Exactly the CRD storage version is expected to carry this.
    pub referenceable: bool,

    /// Whether this version is served by the API server
    pub served: bool,

    /// OpenAPI schema of this version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<CompositeResourceValidation>,

    /// Additional `kubectl get` columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_printer_columns: Vec<CustomResourceColumnDefinition>,

    /// Set only when the version is deprecated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Warning returned to clients of a deprecated version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_warning: Option<String>,
}

/// Schema of an XRD version.
///
/// The OpenAPI document is kept as an opaque JSON value, which decouples it
/// from the typed `JSONSchemaProps` of the CRD it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResourceValidation {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: RawExtension,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResourceDefinitionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
