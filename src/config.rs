//! Configuration for producers and consumers
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (cdevents.toml)
//! - Environment variables (CDEVENTS__*)
//!
//! ## Example config file (cdevents.toml):
//! ```toml
//! [producer]
//! default_source = "/ci/pipelines"
//! id_prefix = "ci"
//!
//! [consumer]
//! validate_on_parse = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Settings applied when creating events
    #[serde(default)]
    pub producer: ProducerConfig,

    /// Settings applied when decoding received events
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// Producer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Source stamped on new events
    #[serde(default)]
    pub default_source: String,

    /// When set, ids are `<prefix>-<n>` instead of random UUIDs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,
}

/// Consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Run schema validation after a successful decode
    #[serde(default = "default_true")]
    pub validate_on_parse: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            validate_on_parse: true,
        }
    }
}

impl SdkConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["cdevents.toml", ".cdevents.toml", "config/cdevents.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "cdevents", "cdevents") {
            let xdg_config = config_dir.config_dir().join("cdevents.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CDEVENTS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
