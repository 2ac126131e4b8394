//! XRD generator
//!
//! Builds one CRD per API kind found in the loaded packages and writes it
//! out as a Crossplane CompositeResourceDefinition.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use crossplane_crd::{KindRegistry, Parser, ParserOptions};
use crossplane_gen_plugin::{
    FieldKind, GenerationContext, Generator, OptionField, OptionValue, OptionValueError,
};
use crossplane_xrd::{crd_to_xrd, ensure_storage_version};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Generator name used on the command line
pub const NAME: &str = "xrd";

/// Generates Crossplane XRDs from CRD sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XrdGenerator {
    /// Drop properties whose name starts with `_`
    pub ignore_unexported_fields: Option<bool>,

    /// Allow `type: number` schemas
    pub allow_dangerous_types: Option<bool>,

    /// Truncate descriptions to this many bytes, `0` keeps them whole
    pub max_desc_len: Option<usize>,

    /// Emit the full schema for embedded `metadata` objects
    pub generate_embedded_object_meta: Option<bool>,

    /// File whose contents prefix every generated file
    pub header_file: Option<PathBuf>,

    /// Replaces ` YEAR` in the header
    pub year: Option<String>,
}

type Setter = fn(&mut XrdGenerator, OptionValue) -> Result<(), OptionValueError>;

const OPTIONS: &[(OptionField, Setter)] = &[
    (
        OptionField {
            name: "ignoreUnexportedFields",
            kind: FieldKind::Bool,
            help: "drop fields whose name starts with an underscore (default false)",
        },
        set_ignore_unexported_fields,
    ),
    (
        OptionField {
            name: "allowDangerousTypes",
            kind: FieldKind::Bool,
            help: "allow floating point number types, which are not portable (default false)",
        },
        set_allow_dangerous_types,
    ),
    (
        OptionField {
            name: "maxDescLen",
            kind: FieldKind::Int,
            help: "maximum description length in bytes, 0 for no limit (default no limit)",
        },
        set_max_desc_len,
    ),
    (
        OptionField {
            name: "generateEmbeddedObjectMeta",
            kind: FieldKind::Bool,
            help: "generate the schema of embedded metadata fields instead of an empty object (default false)",
        },
        set_generate_embedded_object_meta,
    ),
    (
        OptionField {
            name: "headerFile",
            kind: FieldKind::String,
            help: "file whose contents are prepended to every generated file (default none)",
        },
        set_header_file,
    ),
    (
        OptionField {
            name: "year",
            kind: FieldKind::String,
            help: "value substituted for \" YEAR\" in the header (default empty)",
        },
        set_year,
    ),
];

fn set_ignore_unexported_fields(g: &mut XrdGenerator, v: OptionValue) -> Result<(), OptionValueError> {
    g.ignore_unexported_fields = Some(v.into_bool()?);
    Ok(())
}

fn set_allow_dangerous_types(g: &mut XrdGenerator, v: OptionValue) -> Result<(), OptionValueError> {
    g.allow_dangerous_types = Some(v.into_bool()?);
    Ok(())
}

fn set_max_desc_len(g: &mut XrdGenerator, v: OptionValue) -> Result<(), OptionValueError> {
    let len = usize::try_from(v.into_int()?)
        .map_err(|_| OptionValueError::Invalid("maxDescLen must not be negative".to_string()))?;
    g.max_desc_len = Some(len);
    Ok(())
}

fn set_generate_embedded_object_meta(
    g: &mut XrdGenerator,
    v: OptionValue,
) -> Result<(), OptionValueError> {
    g.generate_embedded_object_meta = Some(v.into_bool()?);
    Ok(())
}

fn set_header_file(g: &mut XrdGenerator, v: OptionValue) -> Result<(), OptionValueError> {
    g.header_file = Some(PathBuf::from(v.into_string()?));
    Ok(())
}

fn set_year(g: &mut XrdGenerator, v: OptionValue) -> Result<(), OptionValueError> {
    g.year = Some(v.into_string()?);
    Ok(())
}

/// Drop the top-level `status` key from a rendered XRD
pub fn remove_xrd_status(object: &mut Map<String, Value>) -> Result<()> {
    object.remove("status");
    Ok(())
}

impl XrdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser options with only the explicitly set toggles overridden
    pub fn parser_options(&self) -> ParserOptions {
        let mut options = ParserOptions::default();
        if let Some(value) = self.ignore_unexported_fields {
            options.ignore_unexported_fields = value;
        }
        if let Some(value) = self.allow_dangerous_types {
            options.allow_dangerous_types = value;
        }
        if let Some(value) = self.generate_embedded_object_meta {
            options.generate_embedded_object_meta = value;
        }
        options
    }

    /// Header text with ` YEAR` replaced, or empty when no header file is set
    fn header(&self, context: &GenerationContext) -> Result<String> {
        let Some(path) = &self.header_file else {
            return Ok(String::new());
        };

        let bytes = context.read_file(path)?;
        let header = String::from_utf8(bytes)
            .with_context(|| format!("Header file {} is not valid UTF-8", path.display()))?;
        let year = self.year.as_deref().unwrap_or_default();

        Ok(header.replace(" YEAR", &format!(" {}", year)))
    }
}

#[async_trait]
impl Generator for XrdGenerator {
    fn name(&self) -> &str {
        NAME
    }

    fn help(&self) -> &str {
        "generates Crossplane CompositeResourceDefinitions from CRD sources"
    }

    fn option_fields(&self) -> Vec<OptionField> {
        OPTIONS.iter().map(|(field, _)| *field).collect()
    }

    fn set_option(&mut self, field: &str, value: OptionValue) -> Result<(), OptionValueError> {
        let (_, setter) = OPTIONS
            .iter()
            .find(|(option, _)| option.name == field)
            .ok_or_else(|| OptionValueError::UnknownField(field.to_string()))?;
        setter(self, value)
    }

    fn register_kinds(&self, into: &mut KindRegistry) {
        crossplane_crd::register_kinds(into);
    }

    async fn generate(&self, context: &GenerationContext) -> Result<()> {
        let mut parser = Parser::new(self.parser_options());
        parser.add_known_types();

        for root in &context.roots {
            parser
                .need_package(root)
                .with_context(|| format!("Failed to load package {}", root.id))?;
        }

        let kinds = parser.find_kube_kinds();
        if context.roots.is_empty() || kinds.is_empty() {
            debug!("No API kinds found, nothing to generate");
            return Ok(());
        }

        let header = self.header(context)?;

        for group_kind in &kinds {
            parser.need_crd_for(group_kind, self.max_desc_len)?;
            let crd = parser
                .custom_resource_definition(group_kind)
                .ok_or_else(|| anyhow!("No CRD was built for {}", group_kind))?;

            ensure_storage_version(crd)?;
            let xrd = crd_to_xrd(crd);

            let file_name = format!("{}_{}.yaml", crd.spec.group, crd.spec.names.plural);
            context.write_yaml(&file_name, &header, &[xrd], &[remove_xrd_status])?;
            info!("Generated XRD for {} in {}", group_kind, file_name);
        }

        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}
