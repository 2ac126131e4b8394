//! CRD to XRD conversion

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionVersion, CustomResourceValidation,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use thiserror::Error;
use tracing::warn;

use crate::types::{
    CompositeResourceDefinition, CompositeResourceDefinitionSpec,
    CompositeResourceDefinitionVersion, CompositeResourceValidation,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("XRD {kind}.{group} must have at least one version marked as the storage version")]
    MissingStorageVersion { kind: String, group: String },
}

/// Whether any version of the CRD is its storage version
pub fn has_storage_version(crd: &CustomResourceDefinition) -> bool {
    crd.spec.versions.iter().any(|version| version.storage)
}

/// Reject CRDs without a storage version.
///
/// Several storage versions are accepted; only "none" is an error.
pub fn ensure_storage_version(crd: &CustomResourceDefinition) -> Result<(), ConvertError> {
    if has_storage_version(crd) {
        return Ok(());
    }

    Err(ConvertError::MissingStorageVersion {
        kind: crd.spec.names.kind.clone(),
        group: crd.spec.group.clone(),
    })
}

/// Convert a CRD into a Crossplane v2 XRD.
///
/// Callers are expected to run [`ensure_storage_version`] first; without a
/// storage version the resulting XRD has no referenceable version.
pub fn crd_to_xrd(crd: &CustomResourceDefinition) -> CompositeResourceDefinition {
    let metadata = ObjectMeta {
        name: crd.metadata.name.clone(),
        annotations: crd.metadata.annotations.clone(),
        labels: crd.metadata.labels.clone(),
        ..ObjectMeta::default()
    };

    let spec = CompositeResourceDefinitionSpec {
        group: crd.spec.group.clone(),
        names: crd.spec.names.clone(),
        versions: convert_versions(&crd.spec.versions),
        conversion: crd.spec.conversion.clone(),
    };

    CompositeResourceDefinition::new(metadata, spec)
}

fn convert_versions(
    crd_versions: &[CustomResourceDefinitionVersion],
) -> Vec<CompositeResourceDefinitionVersion> {
    crd_versions.iter().map(convert_version).collect()
}

fn convert_version(crd_version: &CustomResourceDefinitionVersion) -> CompositeResourceDefinitionVersion {
    let mut xrd_version = CompositeResourceDefinitionVersion {
        name: crd_version.name.clone(),
        referenceable: crd_version.storage,
        served: crd_version.served,
        schema: convert_schema(&crd_version.name, crd_version.schema.as_ref()),
        additional_printer_columns: crd_version
            .additional_printer_columns
            .clone()
            .unwrap_or_default(),
        deprecated: None,
        deprecation_warning: None,
    };

    if crd_version.deprecated == Some(true) {
        xrd_version.deprecated = Some(true);
        xrd_version.deprecation_warning = crd_version.deprecation_warning.clone();
    }

    xrd_version
}

fn convert_schema(
    version: &str,
    validation: Option<&CustomResourceValidation>,
) -> Option<CompositeResourceValidation> {
    let schema = validation?.open_api_v3_schema.as_ref()?;

    match serde_json::to_value(schema) {
        Ok(raw) => Some(CompositeResourceValidation {
            open_api_v3_schema: RawExtension(raw),
        }),
        Err(error) => {
            // The version is still emitted, just without a schema.
            warn!(version, %error, "Failed to encode OpenAPI schema, omitting it from the XRD");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
        CustomResourceColumnDefinition, CustomResourceConversion,
        CustomResourceDefinitionNames, CustomResourceDefinitionSpec, JSONSchemaProps,
    };
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn version(name: &str, storage: bool) -> CustomResourceDefinitionVersion {
        CustomResourceDefinitionVersion {
            name: name.to_string(),
            served: true,
            storage,
            ..Default::default()
        }
    }

    fn crd(versions: Vec<CustomResourceDefinitionVersion>) -> CustomResourceDefinition {
        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some("widgets.example.org".to_string()),
                labels: Some(BTreeMap::from([(
                    "app.kubernetes.io/part-of".to_string(),
                    "widgets".to_string(),
                )])),
                annotations: Some(BTreeMap::from([(
                    "example.org/owner".to_string(),
                    "platform".to_string(),
                )])),
                namespace: Some("ignored".to_string()),
                ..Default::default()
            },
            spec: CustomResourceDefinitionSpec {
                group: "example.org".to_string(),
                names: CustomResourceDefinitionNames {
                    kind: "Widget".to_string(),
                    plural: "widgets".to_string(),
                    singular: Some("widget".to_string()),
                    ..Default::default()
                },
                scope: "Namespaced".to_string(),
                versions,
                ..Default::default()
            },
            status: None,
        }
    }

    #[test]
    fn test_single_storage_version() {
        let xrd = crd_to_xrd(&crd(vec![version("v1", true)]));

        assert_eq!(xrd.api_version, "apiextensions.crossplane.io/v2");
        assert_eq!(xrd.kind, "CompositeResourceDefinition");
        assert_eq!(xrd.spec.versions.len(), 1);
        assert_eq!(xrd.spec.versions[0].name, "v1");
        assert!(xrd.spec.versions[0].referenceable);
        assert!(xrd.spec.versions[0].served);
        assert!(xrd.spec.versions[0].schema.is_none());
        assert!(xrd.status.is_none());
    }

    #[rstest]
    #[case(vec![false, true])]
    #[case(vec![true, false])]
    #[case(vec![true, true])]
    #[case(vec![false, false, true])]
    fn test_referenceable_follows_storage(#[case] storage: Vec<bool>) {
        let versions = storage
            .iter()
            .enumerate()
            .map(|(i, stored)| version(&format!("v{}", i + 1), *stored))
            .collect();

        let xrd = crd_to_xrd(&crd(versions));

        let names: Vec<_> = xrd.spec.versions.iter().map(|v| v.name.clone()).collect();
        let expected_names: Vec<_> = (1..=storage.len()).map(|i| format!("v{i}")).collect();
        assert_eq!(names, expected_names);

        let referenceable: Vec<_> = xrd.spec.versions.iter().map(|v| v.referenceable).collect();
        assert_eq!(referenceable, storage);
    }

    #[test]
    fn test_identity_fields_are_copied() {
        let source = crd(vec![version("v1", true)]);
        let xrd = crd_to_xrd(&source);

        assert_eq!(xrd.metadata.name, source.metadata.name);
        assert_eq!(xrd.metadata.labels, source.metadata.labels);
        assert_eq!(xrd.metadata.annotations, source.metadata.annotations);
        assert_eq!(xrd.metadata.namespace, None);
        assert_eq!(xrd.spec.group, source.spec.group);
        assert_eq!(xrd.spec.names, source.spec.names);
    }

    #[test]
    fn test_duplicate_version_names_are_kept() {
        let xrd = crd_to_xrd(&crd(vec![version("v1", false), version("v1", true)]));

        assert_eq!(xrd.spec.versions.len(), 2);
        assert!(!xrd.spec.versions[0].referenceable);
        assert!(xrd.spec.versions[1].referenceable);
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(Some(false), Some("ignored"), None)]
    #[case(Some(true), Some("v1 is going away"), Some("v1 is going away"))]
    #[case(Some(true), None, None)]
    fn test_deprecation_is_copied_only_when_set(
        #[case] deprecated: Option<bool>,
        #[case] warning: Option<&str>,
        #[case] expected_warning: Option<&str>,
    ) {
        let mut v1 = version("v1", true);
        v1.deprecated = deprecated;
        v1.deprecation_warning = warning.map(str::to_string);

        let xrd = crd_to_xrd(&crd(vec![v1]));
        let converted = &xrd.spec.versions[0];

        let expected_flag = (deprecated == Some(true)).then_some(true);
        assert_eq!(converted.deprecated, expected_flag);
        assert_eq!(converted.deprecation_warning.as_deref(), expected_warning);
    }

    #[test]
    fn test_printer_columns_and_conversion() {
        let mut v1 = version("v1", true);
        v1.additional_printer_columns = Some(vec![CustomResourceColumnDefinition {
            name: "Size".to_string(),
            type_: "integer".to_string(),
            json_path: ".spec.size".to_string(),
            ..Default::default()
        }]);
        let mut v2 = version("v2", false);
        v2.additional_printer_columns = Some(Vec::new());

        let mut source = crd(vec![v1, v2]);
        source.spec.conversion = Some(CustomResourceConversion {
            strategy: "None".to_string(),
            webhook: None,
        });

        let xrd = crd_to_xrd(&source);

        assert_eq!(xrd.spec.versions[0].additional_printer_columns.len(), 1);
        assert_eq!(xrd.spec.versions[0].additional_printer_columns[0].name, "Size");
        assert!(xrd.spec.versions[1].additional_printer_columns.is_empty());
        assert_eq!(xrd.spec.conversion, source.spec.conversion);
    }

    #[test]
    fn test_schema_is_reencoded_as_raw_value() {
        let schema = JSONSchemaProps {
            type_: Some("object".to_string()),
            properties: Some(BTreeMap::from([(
                "spec".to_string(),
                JSONSchemaProps {
                    type_: Some("object".to_string()),
                    description: Some("Desired state.".to_string()),
                    ..Default::default()
                },
            )])),
            ..Default::default()
        };
        let mut v1 = version("v1", true);
        v1.schema = Some(CustomResourceValidation {
            open_api_v3_schema: Some(schema),
        });

        let xrd = crd_to_xrd(&crd(vec![v1]));
        let raw = &xrd.spec.versions[0]
            .schema
            .as_ref()
            .expect("schema should be converted")
            .open_api_v3_schema
            .0;

        assert_eq!(raw["type"], "object");
        assert_eq!(raw["properties"]["spec"]["description"], "Desired state.");
    }

    #[test]
    fn test_empty_validation_has_no_schema() {
        let mut v1 = version("v1", true);
        v1.schema = Some(CustomResourceValidation {
            open_api_v3_schema: None,
        });

        let xrd = crd_to_xrd(&crd(vec![v1]));
        assert!(xrd.spec.versions[0].schema.is_none());
    }

    #[test]
    fn test_missing_storage_version_is_rejected() {
        let source = crd(vec![version("v1alpha1", false), version("v1", false)]);

        let err = ensure_storage_version(&source).unwrap_err();
        assert_eq!(
            err,
            ConvertError::MissingStorageVersion {
                kind: "Widget".to_string(),
                group: "example.org".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "XRD Widget.example.org must have at least one version marked as the storage version"
        );
    }

    #[test]
    fn test_multiple_storage_versions_are_accepted() {
        let source = crd(vec![version("v1alpha1", true), version("v1", true)]);
        assert!(ensure_storage_version(&source).is_ok());
    }

    #[test]
    fn test_serialized_version_shape() {
        let xrd = crd_to_xrd(&crd(vec![version("v1", true)]));
        let yaml = serde_yaml::to_value(&xrd).unwrap();

        let version = &yaml["spec"]["versions"][0];
        assert_eq!(version["name"].as_str(), Some("v1"));
        assert_eq!(version["referenceable"].as_bool(), Some(true));
        assert_eq!(version["served"].as_bool(), Some(true));
        assert!(version.get("storage").is_none());
        assert!(version.get("deprecated").is_none());
        assert!(version.get("additionalPrinterColumns").is_none());
        assert!(yaml.get("status").is_none());
    }
}
