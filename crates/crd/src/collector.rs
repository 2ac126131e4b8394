//! Collect CRDs from Rust types deriving `kube::CustomResource`

use std::collections::HashMap;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

use crate::error::Error;
use crate::loader::{Document, Package};
use crate::parser::GroupKind;
use crate::{CRD_API_VERSION, CRD_KIND};

/// Builds a [`Package`] out of API types.
///
/// Every registered type contributes one version of its kind. Once a storage
/// version is named for a kind, all other versions of that kind are marked
/// `storage: false`; otherwise the flags generated by kube are kept.
#[derive(Debug, Clone, Default)]
pub struct TypeCollector {
    crds: Vec<CustomResourceDefinition>,
    storage_versions: HashMap<GroupKind, String>,
}

impl TypeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the CRD generated for `K`
    pub fn with<K: CustomResourceExt>(self) -> Self {
        self.with_crd(K::crd())
    }

    /// Add an already built CRD
    pub fn with_crd(mut self, crd: CustomResourceDefinition) -> Self {
        self.crds.push(crd);
        self
    }

    /// Make the version of `K` the storage version of its kind
    pub fn storage_version<K: CustomResourceExt>(mut self) -> Self {
        let resource = K::api_resource();
        self.storage_versions.insert(
            GroupKind::new(resource.group, resource.kind),
            resource.version,
        );
        self
    }

    pub fn into_package(self, id: impl Into<String>) -> Result<Package, Error> {
        let mut documents = Vec::with_capacity(self.crds.len());

        for mut crd in self.crds {
            if let Some(stored) = self.storage_versions.get(&GroupKind::of(&crd)) {
                for version in crd.spec.versions.iter_mut() {
                    version.storage = &version.name == stored;
                }
            }

            let value = serde_yaml::to_value(&crd).map_err(|source| Error::Encode {
                name: crd.metadata.name.clone().unwrap_or_default(),
                source,
            })?;

            documents.push(Document {
                api_version: CRD_API_VERSION.to_string(),
                kind: CRD_KIND.to_string(),
                value,
            });
        }

        Ok(Package::new(id, documents))
    }
}
