//! Service configuration.
//!
//! Loaded from a TOML file with serde defaults for every field, so an
//! empty file (or no file at all) yields a fully working development
//! configuration. A JSON schema can be exported for editor tooling.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load or validate a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Model artifact candidate paths.
    pub artifact: ArtifactConfig,
    /// Response cache tuning.
    pub cache: CacheConfig,
    /// HTTP server binding.
    pub server: ServerSection,
    /// Logging output options.
    pub observability: ObservabilityConfig,
}

/// Where to look for model artifacts, in preference order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    /// Preferred artifact, typically a small model for test environments.
    pub test_path: PathBuf,
    /// Full production artifact, tried when the test artifact is absent.
    pub production_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            test_path: PathBuf::from("models/stress_model_test.json"),
            production_path: PathBuf::from("models/stress_model.json"),
        }
    }
}

impl ArtifactConfig {
    /// Candidate paths in load-preference order.
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        vec![self.test_path.clone(), self.production_path.clone()]
    }
}

/// Response cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds.
    pub ttl_s: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_s: 300 }
    }
}

impl CacheConfig {
    /// TTL as a [`std::time::Duration`].
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_s)
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Logging output options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// Structured JSON for log aggregators.
    Json,
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on read, parse, or validation failure.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_s == 0 {
            return Err(ConfigError::Invalid(
                "cache.ttl_s must be at least 1 second".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.artifact.candidate_paths().is_empty() {
            return Err(ConfigError::Invalid(
                "artifact must declare at least one candidate path".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON schema for the configuration file, for editor tooling.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the schema cannot be serialized.
    pub fn export_schema() -> Result<String, ConfigError> {
        let schema = schemars::schema_for!(ServiceConfig);
        serde_json::to_string_pretty(&schema)
            .map_err(|e| ConfigError::Invalid(format!("schema serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.cache.ttl_s, 300);
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.artifact.candidate_paths(),
            vec![
                PathBuf::from("models/stress_model_test.json"),
                PathBuf::from("models/stress_model.json"),
            ]
        );
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: ServiceConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_toml_overrides_one_section() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [cache]
            ttl_s = 60

            [observability]
            log_format = "json"
            "#,
        )
        .expect("partial config parses");
        assert_eq!(config.cache.ttl_s, 60);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.server.port, 8000, "untouched sections stay default");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str("unknown_section = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_ttl_fails_validation() {
        let mut config = ServiceConfig::default();
        config.cache.ttl_s = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[server]\nport = 9001\n")
            .expect("write config");
        let config = ServiceConfig::from_file(file.path()).expect("file loads");
        assert_eq!(config.server.port, 9001);
    }

    #[test]
    fn test_schema_export_mentions_sections() {
        let schema = ServiceConfig::export_schema().expect("schema exports");
        assert!(schema.contains("artifact"));
        assert!(schema.contains("ttl_s"));
    }
}
