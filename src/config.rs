// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewer settings and the key/value store they are read from.
//!
//! Settings live behind a [`PlatformBridge`] so the application never reads
//! global state directly. [`FileBridge`] persists them as a YAML map in the
//! per-user configuration directory; [`MemoryBridge`] keeps them in memory.

use crate::error::{Result, ViewerError};
use crate::io::api::{DEVELOPMENT_URL, PRODUCTION_URL};
use crate::io::server::DEFAULT_PORT;
use anyhow::Context;
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const KEY_FRAME_RATE: &str = "frameRate";
pub const KEY_USE_DEV: &str = "useDev";
pub const KEY_API_TOKEN: &str = "apiToken";
pub const KEY_DEV_TOKEN: &str = "devToken";
pub const KEY_LOG_ROOT: &str = "logRoot";
pub const KEY_SERVER_PORT: &str = "serverPort";
pub const KEY_SCRUB_DEBOUNCE_MS: &str = "scrubDebounceMs";
pub const KEY_CAPTURE_DIR: &str = "captureDir";

/// Access to host-provided settings.
pub trait PlatformBridge: Send + Sync {
    fn get_value(&self, key: &str) -> Option<String>;

    fn set_value(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Where the settings are persisted, if anywhere.
    fn config_path(&self) -> Option<PathBuf>;
}

/// Settings stored as a YAML map on disk.
pub struct FileBridge {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileBridge {
    /// Open the settings file at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let yaml = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if yaml.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open `config.yaml` in the per-user configuration directory.
    pub fn user_default() -> anyhow::Result<Self> {
        let dirs = ProjectDirs::from("com", "berlin-united", "vat-viewer")
            .context("No home directory to store settings in")?;
        Self::open(dirs.config_dir().join("config.yaml"))
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(values)?;
        std::fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl PlatformBridge for FileBridge {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set_value(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self.values.lock();
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *values = updated;
        Ok(())
    }

    fn config_path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

/// Settings kept in memory only.
#[derive(Default)]
pub struct MemoryBridge {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.values.lock().insert(key.to_string(), value.to_string());
        self
    }
}

impl PlatformBridge for MemoryBridge {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set_value(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn config_path(&self) -> Option<PathBuf> {
        None
    }
}

/// Resolved viewer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    pub frame_rate: f64,
    pub use_dev: bool,
    pub api_token: Option<String>,
    pub dev_token: Option<String>,
    /// Directory served by the local video server.
    pub log_root: Option<PathBuf>,
    pub server_port: u16,
    pub scrub_debounce_ms: u64,
    pub capture_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            use_dev: false,
            api_token: None,
            dev_token: None,
            log_root: None,
            server_port: DEFAULT_PORT,
            scrub_debounce_ms: 50,
            capture_dir: std::env::temp_dir(),
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ViewerError::InvalidArgument(format!("{key}: cannot parse {raw:?}")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ViewerError::InvalidArgument(format!(
            "{key}: expected a boolean, got {raw:?}"
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ViewerConfig {
    /// Read every setting from `bridge`, falling back to defaults.
    pub fn resolve(bridge: &dyn PlatformBridge) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = bridge.get_value(KEY_FRAME_RATE) {
            config.frame_rate = parse_value(KEY_FRAME_RATE, &raw)?;
        }
        if let Some(raw) = bridge.get_value(KEY_USE_DEV) {
            config.use_dev = parse_flag(KEY_USE_DEV, &raw)?;
        }
        config.api_token = non_empty(bridge.get_value(KEY_API_TOKEN));
        config.dev_token = non_empty(bridge.get_value(KEY_DEV_TOKEN));
        config.log_root = non_empty(bridge.get_value(KEY_LOG_ROOT)).map(PathBuf::from);
        if let Some(raw) = bridge.get_value(KEY_SERVER_PORT) {
            config.server_port = parse_value(KEY_SERVER_PORT, &raw)?;
        }
        if let Some(raw) = bridge.get_value(KEY_SCRUB_DEBOUNCE_MS) {
            config.scrub_debounce_ms = parse_value(KEY_SCRUB_DEBOUNCE_MS, &raw)?;
        }
        if let Some(dir) = non_empty(bridge.get_value(KEY_CAPTURE_DIR)) {
            config.capture_dir = PathBuf::from(dir);
        }

        if !(config.frame_rate.is_finite() && config.frame_rate > 0.0) {
            return Err(ViewerError::InvalidArgument(format!(
                "frame rate must be positive, got {}",
                config.frame_rate
            )));
        }
        Ok(config)
    }

    /// API host selected by `use_dev`.
    pub fn api_base_url(&self) -> &'static str {
        if self.use_dev {
            DEVELOPMENT_URL
        } else {
            PRODUCTION_URL
        }
    }

    /// Token matching the selected API host.
    pub fn active_token(&self) -> Option<&str> {
        if self.use_dev {
            self.dev_token.as_deref()
        } else {
            self.api_token.as_deref()
        }
    }

    pub fn scrub_debounce(&self) -> Duration {
        Duration::from_millis(self.scrub_debounce_ms)
    }

    /// Whether `path` lies inside the served log directory.
    pub fn is_under_log_root(&self, path: &Path) -> bool {
        self.log_root
            .as_deref()
            .map(|root| path.starts_with(root))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_settings() {
        let config = ViewerConfig::resolve(&MemoryBridge::new()).unwrap();
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.server_port, 3001);
        assert_eq!(config.scrub_debounce(), Duration::from_millis(50));
        assert_eq!(config.api_base_url(), "https://vat.berlin-united.com");
        assert!(config.active_token().is_none());
    }

    #[test]
    fn test_dev_mode_selects_dev_host_and_token() {
        let bridge = MemoryBridge::new()
            .with(KEY_USE_DEV, "true")
            .with(KEY_API_TOKEN, "prod")
            .with(KEY_DEV_TOKEN, "dev");
        let config = ViewerConfig::resolve(&bridge).unwrap();

        assert_eq!(config.api_base_url(), "http://127.0.0.1:8000");
        assert_eq!(config.active_token(), Some("dev"));
    }

    #[test]
    fn test_invalid_frame_rate_is_rejected() {
        for raw in ["0", "-5", "abc"] {
            let bridge = MemoryBridge::new().with(KEY_FRAME_RATE, raw);
            assert!(matches!(
                ViewerConfig::resolve(&bridge),
                Err(ViewerError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_log_root_membership() {
        let bridge = MemoryBridge::new().with(KEY_LOG_ROOT, "/data/logs");
        let config = ViewerConfig::resolve(&bridge).unwrap();

        assert!(config.is_under_log_root(Path::new("/data/logs/game.mp4")));
        assert!(!config.is_under_log_root(Path::new("/tmp/game.mp4")));
    }

    #[test]
    fn test_file_bridge_persists_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let bridge = FileBridge::open(&path).unwrap();
        assert!(bridge.get_value(KEY_LOG_ROOT).is_none());
        bridge.set_value(KEY_LOG_ROOT, "/data/logs").unwrap();
        bridge.set_value(KEY_SERVER_PORT, "4000").unwrap();

        let reopened = FileBridge::open(&path).unwrap();
        assert_eq!(reopened.get_value(KEY_LOG_ROOT).as_deref(), Some("/data/logs"));
        assert_eq!(reopened.config_path(), Some(path));
        assert_eq!(ViewerConfig::resolve(&reopened).unwrap().server_port, 4000);
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let bridge = FileBridge::open(blocker.join("config.yaml")).unwrap();
        assert!(bridge.set_value(KEY_LOG_ROOT, "/data/logs").is_err());
        assert!(bridge.get_value(KEY_LOG_ROOT).is_none());
    }
}
