//! Storage configuration.

use std::sync::Arc;

use domain::services::StaticLabels;
use serde::Deserialize;
use shared::logging::LoggingConfig;
use thiserror::Error;

use crate::preference::{KeyValueStore, PreferenceEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Key of the preference slot holding the serialized groups.
    #[serde(default = "default_preference_key")]
    pub preference_key: String,

    /// Display name of the main group.
    #[serde(default = "default_main_group_label")]
    pub main_group_label: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            preference_key: default_preference_key(),
            main_group_label: default_main_group_label(),
        }
    }
}

fn default_preference_key() -> String {
    "tracker_groups".to_string()
}
fn default_main_group_label() -> String {
    "Connected devices".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl StorageConfig {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with GT__ prefix, after `.env` is applied
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("GT").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides, without touching
    /// the file system or the environment.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [logging]
            level = "debug"
            format = "pretty"

            [registry]
            preference_key = "tracker_groups"
            main_group_label = "Connected devices"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.registry.preference_key.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "GT__REGISTRY__PREFERENCE_KEY must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Labels the domain uses for display names.
    pub fn labels(&self) -> StaticLabels {
        StaticLabels::new(self.registry.main_group_label.clone())
    }

    /// The preference slot of `store` the registry persists into.
    pub fn preference_entry<S: KeyValueStore>(&self, store: Arc<S>) -> PreferenceEntry<S> {
        PreferenceEntry::new(store, self.registry.preference_key.clone())
    }
}
