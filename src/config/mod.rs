//! Configuration module for USB media provisioning.
//!
//! Every constant the pipeline depends on (volume label, split ceiling,
//! excluded archive path, platform path conventions) lives in `MediaConfig`
//! and is handed to the pipeline constructor.
//!
//! # Module Structure
//!
//! - `loader`: Settings file location, JSON load/save
//! - `validator`: Consistency checks (label rules, chunk size below the FAT32 limit)
//!
//! # Settings Management
//!
//! `SettingsManager` loads `~/.config/goatd-usb/settings.json`, falling back to
//! defaults when the file is missing or unreadable.

pub mod loader;
pub mod validator;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Largest single file a FAT32 volume can hold (4 GiB - 1).
pub const FAT32_MAX_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024 - 1;

/// Provisioning settings for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Label assigned to the formatted target volume
    pub volume_label: String,
    /// Directory under which the OS mounts volumes
    pub volume_root: PathBuf,
    /// Required prefix of raw device identifiers
    pub raw_disk_prefix: String,
    /// Required source image extension, without the dot
    pub image_extension: String,
    /// Relative path of the oversized object (excluded from transfer, then split)
    pub excluded_object: String,
    /// Extension of the split chunk files, without the dot
    pub chunk_extension: String,
    /// Split ceiling in megabytes
    pub chunk_size_mb: u64,
    /// Per-file size limit of the target filesystem
    pub max_file_size_bytes: u64,
    /// Optional timeout applied to every external tool call
    pub tool_timeout_secs: Option<u64>,
    /// Abort before transfer when the source tree does not fit
    pub enforce_capacity: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        MediaConfig {
            volume_label: "WINUSB".to_string(),
            volume_root: PathBuf::from("/Volumes"),
            raw_disk_prefix: "/dev/disk".to_string(),
            image_extension: "iso".to_string(),
            excluded_object: "sources/install.wim".to_string(),
            chunk_extension: "swm".to_string(),
            chunk_size_mb: 4000,
            max_file_size_bytes: FAT32_MAX_FILE_SIZE,
            tool_timeout_secs: None,
            enforce_capacity: false,
        }
    }
}

impl MediaConfig {
    /// Mount path the formatted target will appear at.
    pub fn target_volume_path(&self) -> PathBuf {
        self.volume_root.join(&self.volume_label)
    }

    /// Token prefix used to spot mount points in tool output, e.g. `/Volumes/`.
    pub fn volume_prefix(&self) -> String {
        let root = self.volume_root.to_string_lossy();
        format!("{}/", root.trim_end_matches('/'))
    }

    /// Relative path of the first chunk file, e.g. `sources/install.swm`.
    pub fn chunk_relative_path(&self) -> PathBuf {
        PathBuf::from(&self.excluded_object).with_extension(&self.chunk_extension)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

/// Settings manager for MediaConfig persistence
pub struct SettingsManager;

impl SettingsManager {
    /// Load MediaConfig from the global settings path, or return defaults if
    /// the file doesn't exist.
    ///
    /// ERROR HANDLING: Malformed JSON logs a warning and yields defaults.
    /// Well-formed but invalid settings are an error.
    pub fn load() -> Result<MediaConfig, ConfigError> {
        let path = loader::get_global_settings_path()?;
        Self::load_from(&path)
    }

    /// Same as `load`, against an explicit settings file.
    pub fn load_from(path: &std::path::Path) -> Result<MediaConfig, ConfigError> {
        let config = match loader::load_config_from_file(path) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => {
                log::debug!("[Config] No settings at {}, using defaults", path.display());
                MediaConfig::default()
            }
            Err(ConfigError::InvalidJson(e)) => {
                log::warn!(
                    "[Config] Failed to parse {}, falling back to defaults: {}",
                    path.display(),
                    e
                );
                MediaConfig::default()
            }
            Err(e) => return Err(e),
        };

        validator::validate_media_config(&config)?;
        Ok(config)
    }
}
