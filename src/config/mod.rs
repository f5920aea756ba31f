//! Configuration management for the screening client
//!
//! Settings come from three layers, highest precedence first: CLI flags
//! (which clap already merges with `WALKHUB_*` environment variables), the
//! YAML config file, and built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::{Credentials, SignatureMethod};
use crate::error::{ConfigError, Result};

/// Application configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Walkhub site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub walkhub_url: Option<String>,

    /// Drupal user name for basic HTTP authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Drupal password for basic HTTP authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// OAuth consumer key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,

    /// OAuth consumer secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_secret: Option<String>,

    /// OAuth signature method (HMAC-SHA1 unless set)
    #[serde(default)]
    pub oauth_signature_method: SignatureMethod,

    /// Test execution settings
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Settings for running exported PHPUnit tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Executable that runs a single test file
    #[serde(default = "default_command")]
    pub command: String,

    /// Extra arguments placed before the test file
    #[serde(default)]
    pub args: Vec<String>,

    /// Directory for exported tests and screenshots (temporary if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,

    /// Wall clock limit for one test run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_command() -> String {
    "phpunit".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            work_dir: None,
            timeout_secs: None,
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub walkhub_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".walkhub").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing file at the default location yields an empty config; a
    /// missing file at an explicit path is an error.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(Path::new(path)),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Layer CLI/environment values over the file values
    pub fn apply(&mut self, overrides: Overrides) {
        fn layer(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        layer(&mut self.walkhub_url, overrides.walkhub_url);
        layer(&mut self.username, overrides.username);
        layer(&mut self.password, overrides.password);
        layer(&mut self.consumer_key, overrides.consumer_key);
        layer(&mut self.consumer_secret, overrides.consumer_secret);
    }

    /// The Walkhub base URL without trailing slashes
    pub fn require_walkhub_url(&self) -> Result<String> {
        let url = self
            .walkhub_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingWalkhubUrl)?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "Walkhub URL must start with http:// or https://, got '{}'",
                url
            ))
            .into());
        }

        Ok(url.to_string())
    }

    /// Credential fields as supplied, before any authenticator is chosen
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            signature_method: self.oauth_signature_method,
        }
    }
}
