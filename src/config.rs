//! Remediator configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! mode = "rewrite"              # or "metadata" (default)
//! normalize_whitespace = false  # flatten suggested statements to one line
//! bind_address = "0.0.0.0:8080"
//! max_body_bytes = 67108864     # omit for no request body limit
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{DraftfixError, DraftfixResult};

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "draftfix.toml";

/// What a processed unit returns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One record per located statement, with the suggested rewrite.
    #[default]
    Metadata,
    /// The unit code with every suggested rewrite applied.
    Rewrite,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Metadata => write!(f, "metadata"),
            OutputMode::Rewrite => write!(f, "rewrite"),
        }
    }
}

/// Main remediator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediatorConfig {
    /// Output mode for every unit of every batch
    pub mode: OutputMode,

    /// Collapse whitespace in suggested statements
    pub normalize_whitespace: bool,

    /// Server bind address
    pub bind_address: String,

    /// Largest accepted request body; `None` accepts any size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_body_bytes: Option<usize>,
}

impl Default for RemediatorConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Metadata,
            normalize_whitespace: false,
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: None,
        }
    }
}

impl RemediatorConfig {
    /// Create a new configuration builder
    pub fn builder() -> RemediatorConfigBuilder {
        RemediatorConfigBuilder::default()
    }

    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> DraftfixResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> DraftfixResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DraftfixError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Otherwise the first file found in
    /// [`RemediatorConfig::search_paths`] is used, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> DraftfixResult<Self> {
        if let Some(path) = explicit {
            tracing::debug!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                tracing::debug!("Loading config from {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// `./draftfix.toml`, then `<config dir>/draftfix/config.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("draftfix").join("config.toml"));
        }
        paths
    }
}

/// Builder for RemediatorConfig
#[derive(Debug, Default)]
pub struct RemediatorConfigBuilder {
    config: RemediatorConfig,
}

impl RemediatorConfigBuilder {
    /// Set the output mode
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Enable or disable whitespace normalization
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.config.normalize_whitespace = normalize;
        self
    }

    /// Set the bind address
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_address = addr.into();
        self
    }

    /// Cap the request body size of the HTTP endpoint
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = Some(limit);
        self
    }

    /// Build the configuration
    pub fn build(self) -> RemediatorConfig {
        self.config
    }
}
