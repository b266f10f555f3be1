//! Configuration types, defaults, loading, and validation.

use crate::calculator::fetch::Endpoints;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote endpoint overrides (calculator.aws data plane)
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Default region/currency/locale
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP RPC gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Endpoint URLs for the calculator data plane. Every field has a live
/// production default; overrides exist for tests and proxies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    #[serde(default = "default_definition_base")]
    pub definition_base: String,
    #[serde(default = "default_pricing_base")]
    pub pricing_base: String,
    #[serde(default = "default_save_url")]
    pub save_url: String,
    #[serde(default = "default_load_base")]
    pub load_base: String,
    #[serde(default = "default_share_base")]
    pub share_base: String,
}

fn default_manifest_url() -> String {
    "https://d1qsjq9pzbk1k6.cloudfront.net/manifest/en_US.json".to_string()
}

fn default_definition_base() -> String {
    "https://d1qsjq9pzbk1k6.cloudfront.net/data".to_string()
}

fn default_pricing_base() -> String {
    "https://calculator.aws/pricing/2.0/meteredUnitMaps".to_string()
}

fn default_save_url() -> String {
    "https://dnd5zrqcec4or.cloudfront.net/Prod/v2/saveAs".to_string()
}

fn default_load_base() -> String {
    "https://d3knqfixx3sbls.cloudfront.net".to_string()
}

fn default_share_base() -> String {
    "https://calculator.aws/#/estimate".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            definition_base: default_definition_base(),
            pricing_base: default_pricing_base(),
            save_url: default_save_url(),
            load_base: default_load_base(),
            share_base: default_share_base(),
        }
    }
}

/// Region, currency, and locale defaults applied when tool calls omit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            currency: default_currency(),
            locale: default_locale(),
        }
    }
}

/// HTTP RPC gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Whether the gateway is enabled (default: false; stdio is primary)
    #[serde(default)]
    pub enabled: bool,

    /// Bind address (default: "127.0.0.1")
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Gateway port (default: 18791)
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Allowed CORS origins — must be set explicitly, no cross-origin requests allowed by default
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Optional API key for authenticating incoming requests (Bearer token).
    /// If unset, no authentication is required (suitable for loopback-only use).
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    18791
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            allowed_origins: vec![],
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Canonical base directory: `~/.costcrab/`
pub fn costcrab_home() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let p = home.join(".costcrab");
    if !p.exists() {
        let _ = std::fs::create_dir_all(&p);
    }
    p
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.costcrab/config.toml
    /// 3. Local config: ./costcrab.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        let system_config_path = Self::system_config_path();
        if system_config_path.exists() {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::merge_from_file(&system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::merge_from_file(&local_config_path)?;
        }

        config = Self::apply_env_overrides(config);

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env
    /// overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::merge_from_file(path)?;
        Ok(Self::apply_env_overrides(config))
    }

    /// Get the system config path: ~/.costcrab/config.toml
    pub fn system_config_path() -> PathBuf {
        costcrab_home().join("config.toml")
    }

    /// Get the local config path: ./costcrab.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./costcrab.toml")
    }

    fn merge_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Self) -> Self {
        if let Ok(url) = std::env::var("COSTCRAB_MANIFEST_URL") {
            config.endpoints.manifest_url = url;
        }
        if let Ok(url) = std::env::var("COSTCRAB_DEFINITION_BASE") {
            config.endpoints.definition_base = url;
        }
        if let Ok(url) = std::env::var("COSTCRAB_PRICING_BASE") {
            config.endpoints.pricing_base = url;
        }
        if let Ok(url) = std::env::var("COSTCRAB_SAVE_URL") {
            config.endpoints.save_url = url;
        }
        if let Ok(url) = std::env::var("COSTCRAB_LOAD_BASE") {
            config.endpoints.load_base = url;
        }
        if let Ok(region) = std::env::var("COSTCRAB_DEFAULT_REGION") {
            config.defaults.region = region;
        }
        if let Ok(currency) = std::env::var("COSTCRAB_CURRENCY") {
            config.defaults.currency = currency;
        }
        if let Ok(level) = std::env::var("COSTCRAB_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(file) = std::env::var("COSTCRAB_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }
        if let Ok(key) = std::env::var("COSTCRAB_GATEWAY_API_KEY") {
            config.gateway.api_key = Some(key);
        }
        config
    }

    /// The resolved endpoint set handed to the calculator.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            manifest_url: self.endpoints.manifest_url.clone(),
            definition_base: self.endpoints.definition_base.clone(),
            pricing_base: self.endpoints.pricing_base.clone(),
            save_url: self.endpoints.save_url.clone(),
            load_base: self.endpoints.load_base.clone(),
            share_base: self.endpoints.share_base.clone(),
            currency: self.defaults.currency.clone(),
            locale: self.defaults.locale.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        for (name, url) in [
            ("endpoints.manifest_url", &self.endpoints.manifest_url),
            ("endpoints.definition_base", &self.endpoints.definition_base),
            ("endpoints.save_url", &self.endpoints.save_url),
            ("endpoints.load_base", &self.endpoints.load_base),
        ] {
            if url.is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.region, "us-east-1");
        assert_eq!(config.defaults.currency, "USD");
        assert!(!config.gateway.enabled);
        assert!(config.endpoints.manifest_url.contains("cloudfront"));
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_endpoint() {
        let mut config = Config::default();
        config.endpoints.save_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
[endpoints]
manifest_url = "http://localhost:9000/manifest.json"

[defaults]
region = "eu-west-1"

[logging]
level = "debug"

[gateway]
enabled = true
port = 9999
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.endpoints.manifest_url,
            "http://localhost:9000/manifest.json"
        );
        // Unset endpoint fields keep their defaults
        assert!(config.endpoints.save_url.contains("saveAs"));
        assert_eq!(config.defaults.region, "eu-west-1");
        assert_eq!(config.logging.level, "debug");
        assert!(config.gateway.enabled);
        assert_eq!(config.gateway.port, 9999);
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.defaults.region = "ap-south-1".to_string();

        config.save(temp_file.path()).unwrap();

        let loaded = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(loaded.defaults.region, "ap-south-1");
        assert_eq!(loaded.logging.level, config.logging.level);
    }

    #[test]
    fn test_endpoints_projection() {
        let config = Config::default();
        let endpoints = config.endpoints();
        assert_eq!(
            endpoints.definition_url("lambda"),
            "https://d1qsjq9pzbk1k6.cloudfront.net/data/lambda/en_US.json"
        );
        assert_eq!(
            endpoints.default_pricing_url("lambda"),
            "https://calculator.aws/pricing/2.0/meteredUnitMaps/lambda/USD/current/lambda.json"
        );
        assert_eq!(
            endpoints.share_link("abc"),
            "https://calculator.aws/#/estimate?id=abc"
        );
    }

    #[test]
    fn test_system_config_path() {
        let path = Config::system_config_path();
        assert!(path.to_string_lossy().contains("costcrab"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
