use std::path::{Path, PathBuf};

use nbx_assembler::AssemblerConfig;
use nbx_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Default root directory of the filesystem backends.
pub const DEFAULT_ROOT: &str = ".nbx";

/// Top-level configuration, usually read from `nbx.config.toml`.
///
/// ```toml
/// root = ".nbx"
///
/// [store]
/// chunk_size = 2097152
///
/// [assembler]
/// max_depth = 8
/// parallel = true
/// verify_on_fetch = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NbxConfig {
    pub root: PathBuf,
    pub store: StoreConfig,
    pub assembler: AssemblerConfig,
}

impl Default for NbxConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            store: StoreConfig::default(),
            assembler: AssemblerConfig::default(),
        }
    }
}

impl NbxConfig {
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
