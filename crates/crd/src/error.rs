use std::path::PathBuf;

use thiserror::Error;

use crate::parser::GroupKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source root {root:?} does not exist")]
    RootNotFound { root: String },

    #[error("source root {root:?} did not match any YAML files")]
    NoSourceFiles { root: String },

    #[error("invalid glob pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to decode CustomResourceDefinition from {package}")]
    Decode {
        package: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode CustomResourceDefinition {name}")]
    Encode {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no CustomResourceDefinition was collected for {0}")]
    UnknownKind(GroupKind),

    #[error(
        "{group_kind} version {version}: found float at {path}, the usage of which is highly \
         discouraged, as support for them varies across languages. Please consider serializing \
         your float as string instead. If you are really sure you want to use them, re-run with \
         allowDangerousTypes=true"
    )]
    DangerousType {
        group_kind: GroupKind,
        version: String,
        path: String,
    },
}
