//! metamigrate configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project-local config file name
const LOCAL_CONFIG: &str = ".metamigrate.yml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Store the definitions are read from
    pub source: StoreConfig,

    /// Store the definitions are written to
    pub destination: StoreConfig,

    /// Admin API transport settings shared by both stores
    pub api: ApiConfig,

    /// Migration behaviour
    pub migration: MigrationConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that both stores are named and their token variables are set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        for (role, store) in [("source", &self.source), ("destination", &self.destination)] {
            if store.store.trim().is_empty() {
                return Err(eyre::eyre!("No {} store configured. Set {}.store in the config file.", role, role));
            }
            store.access_token().context(format!("Invalid {} store credentials", role))?;
        }
        if self.source.store == self.destination.store {
            return Err(eyre::eyre!(
                "Source and destination are the same store ({}); refusing to migrate onto itself",
                self.source.store
            ));
        }
        if self.migration.owner_type.trim().is_empty() {
            return Err(eyre::eyre!("migration.owner-type must not be empty"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .metamigrate.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/metamigrate/metamigrate.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialised
    ///
    /// Errors are swallowed; the full load later reports them properly.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(LOCAL_CONFIG)).chain(user_config_path()).collect(),
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("metamigrate").join("metamigrate.yml"))
}

/// One store's address and credential source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store domain, e.g. `my-store.myshopify.com`
    pub store: String,

    /// Environment variable containing the Admin API access token
    #[serde(rename = "access-token-env")]
    pub access_token_env: String,
}

impl StoreConfig {
    /// Resolve the access token from the environment
    pub fn access_token(&self) -> Result<String> {
        debug!(env = %self.access_token_env, "access_token: called");
        if self.access_token_env.is_empty() {
            return Err(eyre::eyre!("No access-token-env configured for store {}", self.store));
        }
        match std::env::var(&self.access_token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(eyre::eyre!(
                "Access token not found. Set the {} environment variable.",
                self.access_token_env
            )),
        }
    }

    /// Admin GraphQL endpoint for the given API version
    pub fn endpoint(&self, api_version: &str) -> String {
        let store = self
            .store
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!("https://{}/admin/api/{}/graphql.json", store, api_version)
    }
}

/// Admin API transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Admin API version segment of the endpoint path
    pub version: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries on transient failures (0 disables retry)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles per attempt
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: "2024-01".to_string(),
            timeout_ms: 30_000,
            max_retries: 3,
            initial_backoff_ms: 1000,
        }
    }
}

/// Migration behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Owner category the field definitions are scoped to
    #[serde(rename = "owner-type")]
    pub owner_type: String,

    /// Page size when listing source field definitions
    #[serde(rename = "field-page-size")]
    pub field_page_size: u32,

    /// Page size when listing metaobject definitions
    #[serde(rename = "type-page-size")]
    pub type_page_size: u32,

    /// Delete a destination definition with the same namespace/key before recreating it
    #[serde(rename = "overwrite-existing")]
    pub overwrite_existing: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            owner_type: "PRODUCT".to_string(),
            field_page_size: 250,
            type_page_size: 100,
            overwrite_existing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn store(name: &str, env: &str) -> StoreConfig {
        StoreConfig {
            store: name.to_string(),
            access_token_env: env.to_string(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.version, "2024-01");
        assert_eq!(config.migration.owner_type, "PRODUCT");
        assert_eq!(config.migration.field_page_size, 250);
        assert_eq!(config.migration.type_page_size, 100);
        assert!(!config.migration.overwrite_existing);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_load_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log-level: DEBUG
source:
  store: src.myshopify.com
  access-token-env: SRC_TOKEN
destination:
  store: dst.myshopify.com
  access-token-env: DST_TOKEN
migration:
  overwrite-existing: true
"#
        )
        .unwrap();

        let path = file.path().to_path_buf();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.source.store, "src.myshopify.com");
        assert_eq!(config.destination.access_token_env, "DST_TOKEN");
        assert!(config.migration.overwrite_existing);
        // Untouched sections keep defaults
        assert_eq!(config.migration.owner_type, "PRODUCT");
        assert_eq!(config.api.max_retries, 3);

        assert_eq!(Config::load_log_level(Some(&path)), Some("DEBUG".to_string()));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/metamigrate.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert_eq!(Config::load_log_level(Some(&path)), None);
    }

    #[test]
    fn test_endpoint_normalises_store() {
        let s = store("https://dev.myshopify.com/", "X");
        assert_eq!(s.endpoint("2024-01"), "https://dev.myshopify.com/admin/api/2024-01/graphql.json");
    }

    #[test]
    fn test_validate_requires_tokens() {
        let config = Config {
            source: store("a.myshopify.com", "MM_TEST_TOKEN_THAT_IS_NEVER_SET"),
            destination: store("b.myshopify.com", "PATH"),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("MM_TEST_TOKEN_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_validate_rejects_same_store() {
        let config = Config {
            source: store("a.myshopify.com", "PATH"),
            destination: store("a.myshopify.com", "PATH"),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let config = Config {
            source: store("a.myshopify.com", "PATH"),
            destination: store("b.myshopify.com", "PATH"),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_store_names() {
        assert!(Config::default().validate().is_err());
    }
}
