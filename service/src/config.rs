//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use voteroll_policies::PolicySettings;

use crate::logging::LogFormat;
use crate::ServiceError;

/// Configuration for the meeting service and the CLI.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Policy used for meetings that do not name one.
    #[serde(default)]
    pub default_policy: Option<String>,

    /// Meeting snapshot the CLI reads when none is given on the command line.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Policy tuning. Stays last: TOML tables follow plain values.
    #[serde(default)]
    pub policies: PolicySettings,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        let config: Self = toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.log_format()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, ServiceError> {
        self.log_format.parse()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            default_policy: None,
            snapshot_path: None,
            policies: PolicySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ServiceConfig {
            default_policy: Some("skk_kfum".into()),
            snapshot_path: Some(PathBuf::from("meeting.json")),
            ..ServiceConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ServiceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, "human");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.policies.hub_group, "skr");
        assert!(config.default_policy.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"
            default_policy = "main_subst_active"

            [policies]
            hub_group = "council"
        "#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.default_policy.as_deref(), Some("main_subst_active"));
        assert_eq!(config.policies.hub_group, "council");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn bad_log_format_is_rejected() {
        let result = ServiceConfig::from_toml_str(r#"log_format = "yaml""#);
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ServiceConfig::from_toml_file("/nonexistent/voteroll.toml");
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }
}
