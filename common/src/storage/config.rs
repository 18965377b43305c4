//! Storage backend configuration.

use serde::{Deserialize, Serialize};

/// Selects and configures the storage backend.
///
/// Deserialized from an internally tagged table:
///
/// ```toml
/// [storage]
/// type = "SlateDb"
/// path = "data"
/// object_store = { type = "Local", path = "/var/lib/reserve" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// Volatile storage, lost when the process exits.
    #[default]
    InMemory,
    /// SlateDB on top of an object store.
    SlateDb(SlateDbStorageConfig),
}

/// Settings for the SlateDB backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlateDbStorageConfig {
    /// Path of the database inside the object store.
    pub path: String,
    /// Object store holding the database.
    pub object_store: ObjectStoreConfig,
    /// Optional SlateDB settings file. When absent, SlateDB's own environment
    /// based settings loading is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
}

/// Object store backing a SlateDB database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectStoreConfig {
    #[default]
    InMemory,
    Local(LocalObjectStoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectStoreConfig {
    /// Root directory, created on open if missing.
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_in_memory() {
        assert_eq!(StorageConfig::default(), StorageConfig::InMemory);
    }

    #[test]
    fn should_parse_slatedb_config_from_toml() {
        // given
        let input = r#"
            type = "SlateDb"
            path = "content"
            object_store = { type = "Local", path = "/tmp/reserve" }
        "#;

        // when
        let config: StorageConfig = toml::from_str(input).unwrap();

        // then
        assert_eq!(
            config,
            StorageConfig::SlateDb(SlateDbStorageConfig {
                path: "content".to_string(),
                object_store: ObjectStoreConfig::Local(LocalObjectStoreConfig {
                    path: "/tmp/reserve".to_string(),
                }),
                settings_path: None,
            })
        );
    }
}
