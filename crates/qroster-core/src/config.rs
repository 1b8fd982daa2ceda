//! Runtime configuration: a TOML file plus environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use qroster_error::{Result, RosterError};
use qroster_remote::RemoteEndpoint;
use qroster_store::{DEFAULT_ROSTER_SLOT, DEFAULT_SESSION_SLOT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::FALLBACK_PASSWORD;

pub const ENV_REMOTE_URL: &str = "QROSTER_REMOTE_URL";
pub const ENV_ANON_KEY: &str = "QROSTER_ANON_KEY";
pub const ENV_DATA_DIR: &str = "QROSTER_DATA_DIR";

fn default_table() -> String {
    "schools".to_owned()
}

const fn default_timeout_secs() -> u64 {
    10
}

/// Hosted backend settings. Absent means every remote call is unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn endpoint(&self) -> RemoteEndpoint {
        let mut endpoint = RemoteEndpoint::new(&self.url, &self.anon_key);
        endpoint.table.clone_from(&self.table);
        endpoint.timeout = Duration::from_secs(self.timeout_secs);
        endpoint
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterConfig {
    /// Directory holding the local store slots.
    pub data_dir: PathBuf,
    pub roster_slot: String,
    pub session_slot: String,
    pub fallback_password: String,
    pub remote: Option<RemoteConfig>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        let data_dir = std::env::var_os("HOME")
            .map_or_else(|| PathBuf::from(".qroster"), |home| PathBuf::from(home).join(".qroster"));
        Self {
            data_dir,
            roster_slot: DEFAULT_ROSTER_SLOT.to_owned(),
            session_slot: DEFAULT_SESSION_SLOT.to_owned(),
            fallback_password: FALLBACK_PASSWORD.to_owned(),
            remote: None,
        }
    }
}

impl RosterConfig {
    /// Parse a TOML document; missing keys take their defaults.
    ///
    /// # Errors
    /// [`RosterError::Config`] on malformed TOML, unknown keys, or an
    /// incomplete `[remote]` table.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| RosterError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the file at `path`.
    ///
    /// # Errors
    /// [`RosterError::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| RosterError::config(format!("{}: {err}", path.display())))?;
        debug!(path = %path.display(), "configuration loaded");
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Setting only the URL or only the key
    /// when no `[remote]` table exists leaves the other one empty, which
    /// [`RosterConfig::validate`] rejects.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        let url = lookup(ENV_REMOTE_URL).filter(|v| !v.is_empty());
        let key = lookup(ENV_ANON_KEY).filter(|v| !v.is_empty());
        if url.is_some() || key.is_some() {
            let remote = self.remote.get_or_insert_with(|| RemoteConfig {
                url: String::new(),
                anon_key: String::new(),
                table: default_table(),
                timeout_secs: default_timeout_secs(),
            });
            if let Some(url) = url {
                remote.url = url;
            }
            if let Some(key) = key {
                remote.anon_key = key;
            }
        }
        self
    }

    /// # Errors
    /// [`RosterError::Config`] for empty slot names or a half-filled remote.
    pub fn validate(&self) -> Result<()> {
        if self.roster_slot.is_empty() || self.session_slot.is_empty() {
            return Err(RosterError::config("slot names must not be empty"));
        }
        if self.roster_slot == self.session_slot {
            return Err(RosterError::config("roster and session slots must differ"));
        }
        if let Some(remote) = &self.remote {
            if remote.url.is_empty() || remote.anon_key.is_empty() {
                return Err(RosterError::config("remote needs both `url` and `anon_key`"));
            }
            if remote.timeout_secs == 0 {
                return Err(RosterError::config("remote timeout must be positive"));
            }
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Option<RemoteEndpoint> {
        self.remote.as_ref().map(RemoteConfig::endpoint)
    }
}
