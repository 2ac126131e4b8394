//! Input and output rules

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Where generated files go
pub trait OutputRule: Send + Sync + fmt::Debug {
    /// Open a writer for a generated file
    fn open(&self, item_path: &str) -> io::Result<Box<dyn Write + Send>>;
}

/// Where auxiliary inputs such as header files are read from
pub trait InputRule: Send + Sync + fmt::Debug {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Read inputs straight from the file system
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFromFileSystem;

impl InputRule for InputFromFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Write every file into a directory, creating it if needed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputToDirectory(pub PathBuf);

impl OutputRule for OutputToDirectory {
    fn open(&self, item_path: &str) -> io::Result<Box<dyn Write + Send>> {
        fs::create_dir_all(&self.0)?;
        let path = self.0.join(item_path);
        debug!("Opening output file {:?}", path);
        Ok(Box::new(File::create(path)?))
    }
}

/// Discard all output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputToNothing;

impl OutputRule for OutputToNothing {
    fn open(&self, _item_path: &str) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(io::sink()))
    }
}

/// Write all output to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputToStdout;

impl OutputRule for OutputToStdout {
    fn open(&self, _item_path: &str) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(io::stdout()))
    }
}

/// Write generated configuration artifacts below a config directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifacts {
    pub config: PathBuf,
}

impl OutputArtifacts {
    pub const DEFAULT_CONFIG: &'static str = "config";
}

impl Default for OutputArtifacts {
    fn default() -> Self {
        Self {
            config: PathBuf::from(Self::DEFAULT_CONFIG),
        }
    }
}

impl OutputRule for OutputArtifacts {
    fn open(&self, item_path: &str) -> io::Result<Box<dyn Write + Send>> {
        OutputToDirectory(self.config.clone()).open(item_path)
    }
}
