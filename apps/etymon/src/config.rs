//! # Configuration Loading
//!
//! Optional `etymon.toml` configuration for the CLI.
//!
//! Resolution order for every setting: command-line flag, then config
//! file, then built-in default. The config file is looked up at the path
//! given by `--config`, falling back to `./etymon.toml` when present.
//!
//! ```toml
//! database = "graphs/etymon.db"
//! backend = "redb"
//! json = false
//! ```

use etymon_core::EtymonError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default database path when neither flag nor config supplies one.
pub const DEFAULT_DATABASE: &str = "etymon.db";

/// Default storage backend.
pub const DEFAULT_BACKEND: &str = "redb";

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "etymon.toml";

// =============================================================================
// CONFIG STRUCTURE
// =============================================================================

/// Settings the CLI accepts from a TOML file. Every field is optional;
/// absent fields fall through to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EtymonConfig {
    /// Path to the graph database.
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" or "file".
    #[serde(default)]
    pub backend: Option<String>,

    /// Emit JSON instead of human-readable output.
    #[serde(default)]
    pub json: Option<bool>,
}

impl EtymonConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EtymonError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EtymonError::IoError(format!("Cannot read config '{}': {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            EtymonError::SerializationError(format!(
                "Invalid config '{}': {e}",
                path.display()
            ))
        })
    }

    /// Load the working-directory config when one exists; defaults
    /// otherwise.
    pub fn discover() -> Result<Self, EtymonError> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the database path against a flag value.
    #[must_use]
    pub fn resolve_database(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    /// Resolve the backend name against a flag value.
    #[must_use]
    pub fn resolve_backend(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.backend.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND.to_string())
    }

    /// Resolve JSON mode: the flag enables it, the config sets the default.
    #[must_use]
    pub fn resolve_json(&self, flag: bool) -> bool {
        flag || self.json.unwrap_or(false)
    }
}

// =============================================================================
// TESTS
// =============================================================================
