//! Queue configuration
//!
//! Settings are plain serde structs so they can be embedded in a larger TOML
//! document or loaded on their own. Every field has a default, so an empty
//! table is a valid configuration.

use crate::queue::error::{QueueError, QueueResult};
use serde::Deserialize;
use std::path::Path;

/// Default number of backlog slots allocated up front
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Per-queue settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Name used in log lines emitted by the arbiter
    pub name: String,
    /// Backlog slots reserved when the queue is created
    pub initial_capacity: usize,
    /// Backlog length at which the arbiter logs a warning
    pub high_water_mark: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "queue".to_string(),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            high_water_mark: None,
        }
    }
}

impl QueueConfig {
    /// Default configuration with a different name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_high_water_mark(mut self, mark: usize) -> Self {
        self.high_water_mark = Some(mark);
        self
    }

    /// Parse and validate a TOML document holding a single queue table
    pub fn from_toml_str(contents: &str) -> QueueResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| QueueError::Config {
            message: format!("Error parsing queue configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a queue configuration file
    pub fn load(path: &Path) -> QueueResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| QueueError::Config {
            message: format!("Error reading configuration file {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> QueueResult<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::Config {
                message: "queue name must not be empty".to_string(),
            });
        }
        if self.high_water_mark == Some(0) {
            return Err(QueueError::Config {
                message: "high_water_mark must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Broadcaster settings
///
/// `subscriber` is the template for every subscriber queue; each queue's name
/// is suffixed with the subscriber id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BroadcasterConfig {
    pub subscriber: QueueConfig,
}

impl BroadcasterConfig {
    pub fn from_toml_str(contents: &str) -> QueueResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| QueueError::Config {
            message: format!("Error parsing broadcaster configuration: {e}"),
        })?;
        config.subscriber.validate()?;
        Ok(config)
    }

    /// Queue configuration for the subscriber with the given id
    pub(crate) fn subscriber_config(&self, id: u64) -> QueueConfig {
        QueueConfig {
            name: format!("{}-{}", self.subscriber.name, id),
            ..self.subscriber.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = QueueConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, QueueConfig::default());
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert_eq!(config.high_water_mark, None);
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let config = QueueConfig::from_toml_str(
            r#"
            name = "events"
            high_water_mark = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "events");
        assert_eq!(config.high_water_mark, Some(500));
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = QueueConfig::from_toml_str("capacity = 10").unwrap_err();
        assert!(matches!(err, QueueError::Config { .. }));
    }

    #[test]
    fn test_zero_high_water_mark_is_rejected() {
        let err = QueueConfig::from_toml_str("high_water_mark = 0").unwrap_err();
        assert_eq!(
            err,
            QueueError::Config {
                message: "high_water_mark must be greater than zero".to_string()
            }
        );
    }

    #[test]
    fn test_blank_name_is_rejected() {
        assert!(QueueConfig::named("  ").validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"from-file\"\ninitial_capacity = 4").unwrap();

        let config = QueueConfig::load(file.path()).unwrap();
        assert_eq!(config.name, "from-file");
        assert_eq!(config.initial_capacity, 4);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = QueueConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, QueueError::Config { .. }));
    }

    #[test]
    fn test_broadcaster_subscriber_template() {
        let config = BroadcasterConfig::from_toml_str(
            r#"
            [subscriber]
            name = "feed"
            high_water_mark = 10
            "#,
        )
        .unwrap();

        let sub = config.subscriber_config(3);
        assert_eq!(sub.name, "feed-3");
        assert_eq!(sub.high_water_mark, Some(10));
    }
}
