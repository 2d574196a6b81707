//! Credential and settings resolution
//!
//! Every key is resolved independently with the following precedence:
//! 1. explicit argument ([`Overrides`])
//! 2. settings file ([`Settings`], YAML)
//! 3. process environment (`CLOUDFLARE_API_KEY`, `CLOUDFLARE_ACCOUNT_ID`, `APP_NAME`)
//!
//! Empty strings are treated as absent at every layer.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "CLOUDFLARE_API_KEY";
pub const ACCOUNT_ID_ENV: &str = "CLOUDFLARE_ACCOUNT_ID";
pub const APP_NAME_ENV: &str = "APP_NAME";
/// Points at a settings file, bypassing discovery
pub const CONFIG_PATH_ENV: &str = "CFIMAGE_CONFIG_PATH";

pub const DEFAULT_APP_NAME: &str = "CloudflareImageApi";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// File-backed settings, `~/.config/cfimage/config.yaml` by default
///
/// ```yaml
/// api_key: "..."
/// account_id: "..."
/// app_name: my-app
/// timeout_secs: 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub account_id: Option<String>,
    pub app_name: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::SettingsNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidSettings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find the settings file
    ///
    /// Search order:
    /// 1. `explicit` path (must exist)
    /// 2. `CFIMAGE_CONFIG_PATH` (must exist)
    /// 3. `<config dir>/cfimage/config.yaml` (optional)
    pub fn find(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_value(CONFIG_PATH_ENV).map(PathBuf::from));

        if let Some(path) = requested {
            if !path.exists() {
                return Err(ConfigError::SettingsNotFound(path));
            }
            return Ok(Some(path));
        }

        Ok(dirs::config_dir()
            .map(|dir| dir.join("cfimage").join("config.yaml"))
            .filter(|path| path.exists()))
    }

    /// Locate and load the settings file, if there is one
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        match Self::find(explicit)? {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load(&path).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Values passed explicitly by the embedding application
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub account_id: Option<String>,
    pub app_name: Option<String>,
    pub timeout: Option<Duration>,
}

/// Immutable credential triple held by the client
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    account_id: String,
    app_name: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        account_id: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            account_id: account_id.into(),
            app_name: app_name.into(),
        }
    }

    /// Resolve each key from explicit value, then settings file, then environment
    pub fn resolve(overrides: &Overrides, settings: Option<&Settings>) -> Self {
        let api_key = pick(
            &overrides.api_key,
            settings.and_then(|s| s.api_key.as_ref()),
            API_KEY_ENV,
        )
        .unwrap_or_default();
        let account_id = pick(
            &overrides.account_id,
            settings.and_then(|s| s.account_id.as_ref()),
            ACCOUNT_ID_ENV,
        )
        .unwrap_or_default();
        let app_name = pick(
            &overrides.app_name,
            settings.and_then(|s| s.app_name.as_ref()),
            APP_NAME_ENV,
        )
        .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        Self {
            api_key,
            account_id,
            app_name,
        }
    }

    /// Credentials from the process environment only
    pub fn from_env() -> Self {
        Self::resolve(&Overrides::default(), None)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn has_account_id(&self) -> bool {
        !self.account_id.is_empty()
    }

    /// Filename transmitted for an upload: `{app_name}-{display_name}`
    pub fn upload_file_name(&self, display_name: &str) -> String {
        format!("{}-{}", self.app_name, display_name)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "***" };
        f.debug_struct("Credentials")
            .field("api_key", &api_key)
            .field("account_id", &self.account_id)
            .field("app_name", &self.app_name)
            .finish()
    }
}

/// Everything needed to construct an [`ImageApiClient`](crate::ImageApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn resolve(overrides: &Overrides, settings: Option<&Settings>) -> Self {
        // zero counts as unset
        let timeout = overrides
            .timeout
            .filter(|t| !t.is_zero())
            .or_else(|| {
                settings
                    .and_then(|s| s.timeout_secs)
                    .filter(|&secs| secs > 0)
                    .map(Duration::from_secs)
            })
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            credentials: Credentials::resolve(overrides, settings),
            timeout,
        }
    }

    /// Discover the settings file and resolve against it
    pub fn load(overrides: &Overrides, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = Settings::discover(config_path)?;
        Ok(Self::resolve(overrides, settings.as_ref()))
    }
}

fn pick(explicit: &Option<String>, from_file: Option<&String>, env_name: &str) -> Option<String> {
    non_empty(explicit.as_ref())
        .or_else(|| non_empty(from_file))
        .or_else(|| env_value(env_name))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
