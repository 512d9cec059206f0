//! Server configuration.

use anyhow::{Context, Result};
use outreach_types::AvailableCredentials;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable consulted when no search-API key is configured.
pub const SEARCH_API_KEY_ENV: &str = "SERPAPI_KEY";
/// Environment variable consulted when no enrichment-API key is configured.
pub const ENRICHMENT_API_KEY_ENV: &str = "SNOV_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

/// Optional third-party integrations used by lead collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub browser_automation: bool,
    #[serde(default)]
    pub search_api_key: Option<String>,
    #[serde(default)]
    pub enrichment_api_key: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// `<data dir>/outreach/crm.db`, relative to the working directory when the
/// platform has no data dir.
fn default_db_path() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_default();
    base.join("outreach").join("crm.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            integrations: IntegrationsConfig::default(),
        }
    }
}

impl Config {
    /// Parse one TOML file. Keys it leaves out take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Load `explicit` if given, else [`DEFAULT_CONFIG_PATH`] when it exists,
    /// else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
            }
            None => Ok(Self::default()),
        }
    }

    /// Fill API keys missing from the file from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let integrations = &mut self.integrations;
        if !has_value(&integrations.search_api_key) {
            integrations.search_api_key = lookup(SEARCH_API_KEY_ENV);
        }
        if !has_value(&integrations.enrichment_api_key) {
            integrations.enrichment_api_key = lookup(ENRICHMENT_API_KEY_ENV);
        }
    }

    /// Which collection integrations are usable, for the tool selector.
    pub fn credentials(&self) -> AvailableCredentials {
        AvailableCredentials {
            browser_automation: self.integrations.browser_automation,
            search_api: has_value(&self.integrations.search_api_key),
            enrichment_api: has_value(&self.integrations.enrichment_api_key),
        }
    }
}

fn has_value(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_apply_to_missing_keys() {
        let config: Config = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.db_path.ends_with("outreach/crm.db"));
        assert_eq!(config.credentials(), AvailableCredentials::default());
    }

    #[test]
    fn test_load_from_file_with_integrations() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outreach.toml");
        std::fs::write(
            &path,
            r#"
            db_path = "/tmp/crm.db"

            [integrations]
            browser_automation = true
            search_api_key = "serp-123"
            enrichment_api_key = "  "
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/crm.db"));
        let creds = config.credentials();
        assert!(creds.browser_automation);
        assert!(creds.search_api);
        assert!(!creds.enrichment_api);
    }

    #[test]
    fn test_environment_fills_missing_keys_only() {
        let mut config = Config::default();
        config.integrations.search_api_key = Some("from-file".into());

        config.apply_env_with(|name| Some(format!("env:{}", name)));

        assert_eq!(
            config.integrations.search_api_key.as_deref(),
            Some("from-file")
        );
        assert_eq!(
            config.integrations.enrichment_api_key.as_deref(),
            Some("env:SNOV_API_KEY")
        );
        assert!(config.credentials().enrichment_api);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
