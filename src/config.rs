//! Replicator configuration

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the tenant domain in `base_url`
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Default API base URL template
pub const DEFAULT_BASE_URL: &str = "https://{domain}.zendesk.com/api/v2";

/// Default file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dc-replicator.toml";

/// Replicator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API base URL template, `{domain}` is replaced per tenant
    pub base_url: String,
    /// Locale id used for the single default variant
    pub default_locale_id: u64,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Extract producer filters
    pub extract: ExtractSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            default_locale_id: 1,
            timeout_secs: 30,
            user_agent: format!("dc-replicator/{}", env!("CARGO_PKG_VERSION")),
            extract: ExtractSettings::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, else from the first default location that
    /// exists (working directory, then user config directory), else defaults
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Using config file");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("dc-replicator").join("config.toml"));
        }
        paths
    }

    /// Parse and validate TOML content
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if !self.base_url.contains(DOMAIN_PLACEHOLDER) {
            return Err(ConfigError::InvalidSetting {
                key: "base_url",
                reason: format!("must contain the {} placeholder", DOMAIN_PLACEHOLDER),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which ticket fields the extract producer keeps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Ids of built-in system fields
    pub system_field_ids: Vec<u64>,
    /// Field types that are never exported
    pub excluded_field_types: Vec<String>,
    /// Field types whose options are exported
    pub choice_field_types: Vec<String>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            system_field_ids: (1..=40).collect(),
            excluded_field_types: [
                "subject",
                "description",
                "status",
                "tickettype",
                "priority",
                "group",
                "assignee",
                "custom_status",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            choice_field_types: vec!["tagger".into(), "dropdown".into()],
        }
    }
}

impl ExtractSettings {
    /// Custom field of an exportable type
    pub fn keeps(&self, field_id: u64, field_type: &str) -> bool {
        !self.system_field_ids.contains(&field_id)
            && !self.excluded_field_types.iter().any(|t| t == field_type)
    }

    /// Field type carries selectable options
    pub fn has_options(&self, field_type: &str) -> bool {
        self.choice_field_types.iter().any(|t| t == field_type)
    }
}
