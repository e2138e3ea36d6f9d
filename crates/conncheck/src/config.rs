//! Conncheck configuration.
//!
//! Configuration lives in /etc/conncheck/config.toml. Every field has a
//! default, so a missing or partial file still yields a runnable check.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/conncheck";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable that disables the device check entirely.
pub const SKIP_ENV_VAR: &str = "CONNCHECK_SKIP";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// How long the mobile-data availability wait may block
    /// (seconds, valid: 1-300)
    #[serde(default = "default_mobile_data_timeout")]
    pub mobile_data_timeout_secs: u64,

    /// NetworkManager poll interval for the availability watch
    /// (milliseconds, valid: 100-10000)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long one Wi-Fi connect attempt may block (seconds, valid: 1-120)
    #[serde(default = "default_wifi_connect_wait")]
    pub wifi_connect_wait_secs: u64,
}

fn default_mobile_data_timeout() -> u64 {
    30 // 30 seconds
}

fn default_poll_interval() -> u64 {
    1000 // 1 second
}

fn default_wifi_connect_wait() -> u64 {
    20 // nmcli's own default is 90 seconds
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            mobile_data_timeout_secs: default_mobile_data_timeout(),
            poll_interval_ms: default_poll_interval(),
            wifi_connect_wait_secs: default_wifi_connect_wait(),
        }
    }
}

impl CheckConfig {
    /// Load config from the system config file, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load from an explicit path (used by `--config` and tests).
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Mobile-data wait timeout with the valid range applied.
    pub fn mobile_data_timeout(&self) -> Duration {
        Duration::from_secs(self.mobile_data_timeout_secs.clamp(1, 300))
    }

    /// Monitor poll interval with the valid range applied.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(100, 10_000))
    }

    /// Wi-Fi connect wait with the valid range applied.
    pub fn wifi_connect_wait(&self) -> Duration {
        Duration::from_secs(self.wifi_connect_wait_secs.clamp(1, 120))
    }

    /// True when the operator disabled the check via environment.
    pub fn skip_requested() -> bool {
        matches!(
            std::env::var(SKIP_ENV_VAR).ok().as_deref(),
            Some("1") | Some("true") | Some("yes")
        )
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}
