//! Per-generator execution context

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossplane_crd::Package;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::traits::{InputFromFileSystem, InputRule, OutputRule, OutputToNothing};

/// A mutation applied to the top-level map of an object before it is written
pub type Transform = fn(&mut Map<String, Value>) -> Result<()>;

/// Everything a generator needs for one run
#[derive(Clone)]
pub struct GenerationContext {
    /// Packages loaded from the configured roots
    pub roots: Vec<Package>,

    /// Where auxiliary inputs are read from
    pub input: Arc<dyn InputRule>,

    /// Where generated files are written
    pub output: Arc<dyn OutputRule>,
}

impl fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("roots", &self.roots.len())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

impl GenerationContext {
    pub fn new(roots: Vec<Package>, output: Arc<dyn OutputRule>) -> Self {
        Self {
            roots,
            input: Arc::new(InputFromFileSystem),
            output,
        }
    }

    /// Read an auxiliary input file through the input rule
    pub fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.input
            .read_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Write objects as a multi-document YAML file through the output rule.
    ///
    /// The header is written verbatim, then each object as `---` followed by
    /// its YAML rendering after the transforms have been applied.
    pub fn write_yaml<T: Serialize>(
        &self,
        item_path: &str,
        header: &str,
        objects: &[T],
        transforms: &[Transform],
    ) -> Result<()> {
        let mut out = self
            .output
            .open(item_path)
            .with_context(|| format!("Failed to open {}", item_path))?;

        out.write_all(header.as_bytes())
            .with_context(|| format!("Failed to write header to {}", item_path))?;

        for object in objects {
            let yaml = yaml_marshal(object, transforms)?;
            out.write_all(b"---\n")
                .and_then(|_| out.write_all(yaml.as_bytes()))
                .with_context(|| format!("Failed to write {}", item_path))?;
        }

        out.flush()
            .with_context(|| format!("Failed to flush {}", item_path))?;
        debug!("Wrote {} object(s) to {}", objects.len(), item_path);
        Ok(())
    }
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self::new(Vec::new(), Arc::new(OutputToNothing))
    }
}

/// Render an object as YAML after applying the transforms to its top-level map.
///
/// Objects that do not serialize to a map are rendered unchanged.
pub fn yaml_marshal<T: Serialize>(object: &T, transforms: &[Transform]) -> Result<String> {
    let mut value = serde_json::to_value(object).context("Failed to encode object")?;

    if let Value::Object(map) = &mut value {
        for transform in transforms {
            transform(map)?;
        }
    }

    serde_yaml::to_string(&value).context("Failed to render YAML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::OutputToDirectory;
    use serde_json::json;
    use tempfile::TempDir;

    fn drop_status(map: &mut Map<String, Value>) -> Result<()> {
        map.remove("status");
        Ok(())
    }

    #[test]
    fn test_yaml_marshal_applies_transforms() {
        let object = json!({"kind": "Widget", "status": {"ready": true}});

        let yaml = yaml_marshal(&object, &[drop_status]).unwrap();

        assert_eq!(yaml, "kind: Widget\n");
    }

    #[test]
    fn test_yaml_marshal_sorts_keys() {
        let object = json!({"spec": {}, "apiVersion": "v1", "kind": "Widget"});

        let yaml = yaml_marshal(&object, &[]).unwrap();

        assert_eq!(yaml, "apiVersion: v1\nkind: Widget\nspec: {}\n");
    }

    #[tokio::test]
    async fn test_write_yaml_layout() {
        let temp_dir = TempDir::new().unwrap();
        let context = GenerationContext::new(
            Vec::new(),
            Arc::new(OutputToDirectory(temp_dir.path().to_path_buf())),
        );

        context
            .write_yaml(
                "out.yaml",
                "# header\n",
                &[json!({"a": 1}), json!({"b": 2})],
                &[],
            )
            .unwrap();

        let written = std::fs::read_to_string(temp_dir.path().join("out.yaml")).unwrap();
        assert_eq!(written, "# header\n---\na: 1\n---\nb: 2\n");
    }

    #[test]
    fn test_read_file_reports_path() {
        let context = GenerationContext::default();

        let err = context
            .read_file(Path::new("/does/not/exist/header.txt"))
            .unwrap_err();

        assert!(err.to_string().contains("/does/not/exist/header.txt"));
    }
}
