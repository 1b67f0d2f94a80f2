use crate::AccountError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the account lives and how to authenticate to it.
///
/// `url` is the account's storage URL (e.g. `https://swift.example.com/v1/AUTH_demo`);
/// `auth_token` is an already-issued token sent as `X-Auth-Token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConfig {
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AccountConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            auth_token: None,
            timeout_secs: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Load config from `~/.config/swiftacct/account.json`.
    pub fn load_default() -> Result<Self, AccountError> {
        let path = default_config_path()?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, AccountError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| AccountError::Config(format!("invalid account config: {e}")))?;
        if config.url.is_empty() {
            return Err(AccountError::Config(format!(
                "{}: url must not be empty",
                path.display()
            )));
        }
        config.url = config.url.trim_end_matches('/').to_owned();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), AccountError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AccountError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf, AccountError> {
    let home =
        std::env::var("HOME").map_err(|_| AccountError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/swiftacct/account.json"))
}
