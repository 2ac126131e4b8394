//! Source root loading
//!
//! A root is one of:
//! - `dir/...` every YAML file below `dir`, recursively
//! - a glob pattern such as `crds/*.yaml`
//! - a directory, meaning its direct YAML children
//! - a single file
//!
//! Every file becomes one [`Package`]. Only documents whose `apiVersion` and
//! `kind` were registered in the [`KindRegistry`] are kept.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Error;

/// Document kinds recognized while loading sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindRegistry {
    kinds: BTreeSet<(String, String)>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an `apiVersion`/`kind` pair. Returns false if it was already known.
    pub fn register(&mut self, api_version: &str, kind: &str) -> bool {
        self.kinds
            .insert((api_version.to_string(), kind.to_string()))
    }

    pub fn contains(&self, api_version: &str, kind: &str) -> bool {
        self.kinds
            .contains(&(api_version.to_string(), kind.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.kinds
            .iter()
            .map(|(api_version, kind)| (api_version.as_str(), kind.as_str()))
    }
}

/// A recognized document from a source file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub api_version: String,
    pub kind: String,
    pub value: serde_yaml::Value,
}

/// All recognized documents of one source
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    /// Unique identifier, the file path for loaded files
    pub id: String,

    /// Source file, if the package was loaded from disk
    pub path: Option<PathBuf>,

    /// Recognized documents, in file order
    pub documents: Vec<Document>,
}

impl Package {
    pub fn new(id: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            id: id.into(),
            path: None,
            documents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Load every package reachable from the given roots, in root order.
///
/// Files reached through more than one root are loaded once.
pub fn load_roots<S: AsRef<str>>(roots: &[S], kinds: &KindRegistry) -> Result<Vec<Package>, Error> {
    let mut packages = Vec::new();
    let mut seen = HashSet::new();

    for root in roots {
        let root = root.as_ref();
        for path in resolve_root(root)? {
            if seen.insert(path.clone()) {
                packages.push(load_file(&path, kinds)?);
            }
        }
    }

    info!(
        "Loaded {} packages from {} roots",
        packages.len(),
        roots.len()
    );
    Ok(packages)
}

fn resolve_root(root: &str) -> Result<Vec<PathBuf>, Error> {
    let files = if root == "..." {
        yaml_files_in(Path::new("."), true, root)?
    } else if let Some(base) = root.strip_suffix("/...") {
        yaml_files_in(Path::new(base), true, root)?
    } else if is_glob(root) {
        expand_glob(root)?
    } else {
        let path = Path::new(root);
        if path.is_dir() {
            yaml_files_in(path, false, root)?
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(Error::RootNotFound {
                root: root.to_string(),
            });
        }
    };

    if files.is_empty() {
        return Err(Error::NoSourceFiles {
            root: root.to_string(),
        });
    }

    debug!("Root {:?} resolved to {} files", root, files.len());
    Ok(files)
}

fn is_glob(root: &str) -> bool {
    root.contains(['*', '?', '['])
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn yaml_files_in(dir: &Path, recursive: bool, root: &str) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::RootNotFound {
            root: root.to_string(),
        });
    }

    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    Ok(walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_yaml(e.path()))
        .map(|e| e.into_path())
        .collect())
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let paths = glob::glob(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for path in paths.filter_map(|p| p.ok()) {
        if path.is_dir() {
            files.extend(yaml_files_in(&path, false, pattern)?);
        } else if is_yaml(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

fn load_file(path: &Path, kinds: &KindRegistry) -> Result<Package, Error> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let documents = parse_documents(&content, kinds).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "Found {} recognized documents in {}",
        documents.len(),
        path.display()
    );

    Ok(Package {
        id: path.display().to_string(),
        path: Some(path.to_path_buf()),
        documents,
    })
}

/// Split a multi-document YAML stream and keep the recognized documents
pub fn parse_documents(content: &str, kinds: &KindRegistry) -> Result<Vec<Document>, serde_yaml::Error> {
    let mut documents = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let api_version = value.get("apiVersion").and_then(|v| v.as_str());
        let kind = value.get("kind").and_then(|v| v.as_str());

        match (api_version, kind) {
            (Some(api_version), Some(kind)) if kinds.contains(api_version, kind) => {
                documents.push(Document {
                    api_version: api_version.to_string(),
                    kind: kind.to_string(),
                    value,
                });
            }
            (api_version, kind) => {
                debug!("Skipping unrecognized document {:?}/{:?}", api_version, kind);
            }
        }
    }

    Ok(documents)
}
