//! Configuration for the content store, the allocator and its reporting.

use std::path::Path;

use common::StorageConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Message shown to operators whenever an allocation fails.
pub const INVALID_TARGET_MESSAGE: &str = "This given post id cannot be used.";

/// Top-level configuration.
///
/// Every section is optional; missing sections take their defaults.
///
/// # Example
///
/// ```toml
/// [storage]
/// type = "InMemory"
///
/// [allocator]
/// strategy = "sequential"
/// release_placeholders = false
///
/// [reporting]
/// site_url = "https://example.com"
/// escalate = true
/// logs_address = "dev@example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend holding the content records and the sequence.
    pub storage: StorageConfig,
    pub allocator: AllocatorConfig,
    pub reporting: ReportingConfig,
    pub messages: Messages,
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }
}

/// How placeholders consume the gap in front of the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// One placeholder carrying the identifier hint `target - 1`. Relies on
    /// the store honoring hints ahead of its sequence.
    #[default]
    Hint,
    /// One placeholder per missing identifier, no hints. Works with any store
    /// but writes `target - current_max - 1` records.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    pub strategy: PlacementStrategy,
    /// Delete placeholders once they have advanced the sequence.
    pub release_placeholders: bool,
    /// Upper bound on placeholders written by the sequential strategy.
    pub max_sequential_gap: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            strategy: PlacementStrategy::Hint,
            release_placeholders: true,
            max_sequential_gap: 10_000,
        }
    }
}

/// Failure logging and opt-in escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Address of the host site, included in every log prefix.
    pub site_url: String,
    /// Forward escalatable failures to `logs_address`. Off by default.
    pub escalate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_address: Option<String>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            escalate: false,
            logs_address: None,
        }
    }
}

/// Operator-facing text. Hosts supply translations by overriding these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub invalid_target: String,
    /// Label of the target field; `{threshold}` is replaced by the identifier
    /// the target must exceed.
    pub field_label: String,
    pub section_text: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            invalid_target: INVALID_TARGET_MESSAGE.to_string(),
            field_label: "Insert a number below, bigger than {threshold}".to_string(),
            section_text: "This page allows to tweak which identifier the next record receives."
                .to_string(),
        }
    }
}
