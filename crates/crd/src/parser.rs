//! CRD parser: turns loaded packages into one CRD per API kind

use std::collections::{HashMap, HashSet};
use std::fmt;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps,
};
use tracing::{debug, info};

use crate::error::Error;
use crate::loader::Package;
use crate::schema;
use crate::{CRD_API_VERSION, CRD_KIND};

/// Name of the known embedded `ObjectMeta` schema
pub const OBJECT_META: &str = "ObjectMeta";

/// API group and kind identifying a CRD
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }

    pub fn of(crd: &CustomResourceDefinition) -> Self {
        Self::new(crd.spec.group.clone(), crd.spec.names.kind.clone())
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.group)
    }
}

/// Parser toggles. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Drop properties whose name starts with `_`
    pub ignore_unexported_fields: bool,

    /// Allow floating point (`type: number`) fields
    pub allow_dangerous_types: bool,

    /// Keep the common fields of embedded `ObjectMeta` instead of a bare object
    pub generate_embedded_object_meta: bool,
}

pub struct Parser {
    options: ParserOptions,
    known_types: HashMap<&'static str, JSONSchemaProps>,
    seen_packages: HashSet<String>,
    kinds: Vec<GroupKind>,
    sources: HashMap<GroupKind, Vec<CustomResourceDefinition>>,
    custom_resource_definitions: HashMap<GroupKind, CustomResourceDefinition>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            known_types: HashMap::new(),
            seen_packages: HashSet::new(),
            kinds: Vec::new(),
            sources: HashMap::new(),
            custom_resource_definitions: HashMap::new(),
        }
    }

    /// Register the well-known schemas used while building CRDs
    pub fn add_known_types(&mut self) {
        self.known_types
            .insert(OBJECT_META, schema::embedded_object_meta());
    }

    /// Ingest the CRD documents of a package. A package is only read once.
    pub fn need_package(&mut self, package: &Package) -> Result<(), Error> {
        if !self.seen_packages.insert(package.id.clone()) {
            return Ok(());
        }

        for document in &package.documents {
            if document.api_version != CRD_API_VERSION || document.kind != CRD_KIND {
                continue;
            }

            let crd: CustomResourceDefinition = serde_yaml::from_value(document.value.clone())
                .map_err(|source| Error::Decode {
                    package: package.id.clone(),
                    source,
                })?;

            let group_kind = GroupKind::of(&crd);
            debug!("Found {} in {}", group_kind, package.id);

            if !self.sources.contains_key(&group_kind) {
                self.kinds.push(group_kind.clone());
            }
            self.sources.entry(group_kind).or_default().push(crd);
        }

        Ok(())
    }

    /// All API kinds seen so far, in the order they were first found
    pub fn find_kube_kinds(&self) -> Vec<GroupKind> {
        self.kinds.clone()
    }

    /// Build the CRD for a kind.
    ///
    /// Definitions of the same kind from several packages are merged: the
    /// first one provides the identity, versions are concatenated in package
    /// order. `max_desc_len` of `None` or `Some(0)` keeps descriptions whole.
    pub fn need_crd_for(
        &mut self,
        group_kind: &GroupKind,
        max_desc_len: Option<usize>,
    ) -> Result<(), Error> {
        if self.custom_resource_definitions.contains_key(group_kind) {
            return Ok(());
        }

        let sources = self
            .sources
            .get(group_kind)
            .ok_or_else(|| Error::UnknownKind(group_kind.clone()))?;

        let mut crd = sources[0].clone();
        for other in &sources[1..] {
            crd.spec.versions.extend(other.spec.versions.iter().cloned());
        }
        crd.status = None;

        for version in crd.spec.versions.iter_mut() {
            if let Some(schema) = version
                .schema
                .as_mut()
                .and_then(|validation| validation.open_api_v3_schema.as_mut())
            {
                self.process_schema(group_kind, &version.name, schema, max_desc_len)?;
            }
        }

        info!(
            "Built CRD for {} with {} versions",
            group_kind,
            crd.spec.versions.len()
        );
        self.custom_resource_definitions
            .insert(group_kind.clone(), crd);
        Ok(())
    }

    fn process_schema(
        &self,
        group_kind: &GroupKind,
        version: &str,
        schema: &mut JSONSchemaProps,
        max_desc_len: Option<usize>,
    ) -> Result<(), Error> {
        if self.options.ignore_unexported_fields {
            schema::strip_unexported_fields(schema);
        }

        if self.options.generate_embedded_object_meta {
            if let Some(object_meta) = self.known_types.get(OBJECT_META) {
                schema::rewrite_embedded_object_meta(schema, object_meta);
            }
        } else {
            schema::rewrite_embedded_object_meta(schema, &schema::collapsed_object_meta());
        }

        if !self.options.allow_dangerous_types {
            if let Some(path) = schema::find_float(schema) {
                return Err(Error::DangerousType {
                    group_kind: group_kind.clone(),
                    version: version.to_string(),
                    path,
                });
            }
        }

        if let Some(max_len) = max_desc_len.filter(|&n| n > 0) {
            schema::truncate_descriptions(schema, max_len);
        }

        Ok(())
    }

    /// The CRD built by [`Parser::need_crd_for`]
    pub fn custom_resource_definition(
        &self,
        group_kind: &GroupKind,
    ) -> Option<&CustomResourceDefinition> {
        self.custom_resource_definitions.get(group_kind)
    }
}
