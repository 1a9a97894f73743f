//! Configuration loader and validator for the Sherpa purchase-order target.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default Sherpa service root. Overridable per environment via `base_url`.
const DEFAULT_BASE_URL: &str = "https://sherpaservices-prd.sherpacloud.eu";

const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Shop identifier the service endpoint is scoped to.
    pub shop_id: String,
    /// Shared security code carried in every request body.
    pub security_code: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds for each SOAP call.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Fallback warehouse for records that carry no `warehouse_code`.
    #[serde(default)]
    pub default_warehouse: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Config {
    /// Full service endpoint: `{base_url}/{shop_id}/Sherpa.asmx`, with any
    /// trailing slash on `base_url` stripped first.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}/Sherpa.asmx", base, self.shop_id)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance. Missing credentials are fatal at
/// startup; everything else has a default.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.shop_id.trim().is_empty() {
        return Err(ConfigError::Invalid("shop_id must be non-empty"));
    }
    if cfg.security_code.trim().is_empty() {
        return Err(ConfigError::Invalid("security_code must be non-empty"));
    }
    if cfg.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("base_url must be non-empty"));
    }
    if cfg.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("timeout_seconds must be > 0"));
    }
    if let Some(wh) = &cfg.default_warehouse {
        if wh.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_warehouse must be non-empty when set",
            ));
        }
    }
    Ok(())
}

/// Example YAML configuration.
pub fn example() -> &'static str {
    r#"shop_id: "YOUR_SHOP_ID"
security_code: "YOUR_SECURITY_CODE"
base_url: "https://sherpaservices-prd.sherpacloud.eu"
timeout_seconds: 300
default_warehouse: "MAINWAREHOUSE"
"#
}
