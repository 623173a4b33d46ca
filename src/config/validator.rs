//! Settings validation.

use crate::config::MediaConfig;
use crate::error::ConfigError;
use std::path::Path;

/// FAT32 volume labels hold at most 11 characters.
const FAT32_LABEL_MAX: usize = 11;

/// Validate the FAT32 volume label (non-empty, <= 11 chars, A-Z 0-9 _ -).
pub fn validate_volume_label(label: &str) -> Result<(), ConfigError> {
    if label.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Volume label cannot be empty".to_string(),
        ));
    }

    if label.len() > FAT32_LABEL_MAX {
        return Err(ConfigError::ValidationFailed(format!(
            "Volume label '{}' exceeds {} characters",
            label, FAT32_LABEL_MAX
        )));
    }

    if let Some(bad) = label
        .chars()
        .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_' || *c == '-'))
    {
        return Err(ConfigError::ValidationFailed(format!(
            "Volume label '{}' contains invalid character '{}'",
            label, bad
        )));
    }

    Ok(())
}

/// Validate that chunks produced at `chunk_size_mb` fit under `max_file_size_bytes`.
pub fn validate_chunk_size(chunk_size_mb: u64, max_file_size_bytes: u64) -> Result<(), ConfigError> {
    if chunk_size_mb == 0 {
        return Err(ConfigError::ValidationFailed(
            "Chunk size must be greater than zero".to_string(),
        ));
    }

    let chunk_bytes = chunk_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
        ConfigError::ValidationFailed(format!("Chunk size {} MB overflows", chunk_size_mb))
    })?;

    if chunk_bytes >= max_file_size_bytes {
        return Err(ConfigError::ValidationFailed(format!(
            "Chunk size {} MB ({} bytes) must stay below the filesystem file limit of {} bytes",
            chunk_size_mb, chunk_bytes, max_file_size_bytes
        )));
    }

    Ok(())
}

/// Validate the excluded object path (relative, non-empty, has a file name).
pub fn validate_excluded_object(relative: &str) -> Result<(), ConfigError> {
    let path = Path::new(relative);
    if relative.is_empty() || path.is_absolute() || path.file_name().is_none() {
        return Err(ConfigError::ValidationFailed(format!(
            "Excluded object must be a relative file path, got: '{}'",
            relative
        )));
    }
    Ok(())
}

/// Validate a complete MediaConfig.
pub fn validate_media_config(config: &MediaConfig) -> Result<(), ConfigError> {
    validate_volume_label(&config.volume_label)?;
    validate_chunk_size(config.chunk_size_mb, config.max_file_size_bytes)?;
    validate_excluded_object(&config.excluded_object)?;

    if !config.volume_root.is_absolute() {
        return Err(ConfigError::ValidationFailed(format!(
            "Volume root must be absolute, got: {}",
            config.volume_root.display()
        )));
    }

    if config.raw_disk_prefix.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Raw disk prefix cannot be empty".to_string(),
        ));
    }

    if config.image_extension.is_empty() || config.chunk_extension.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Image and chunk extensions cannot be empty".to_string(),
        ));
    }

    if config.tool_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationFailed(
            "Tool timeout must be at least one second".to_string(),
        ));
    }

    Ok(())
}
