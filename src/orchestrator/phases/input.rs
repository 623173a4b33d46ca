//! Stage 1: Input Resolution - source image and target device validation.
//!
//! Nothing here touches the target device. The device identifier is only
//! checked syntactically; whether it exists and is removable is left to
//! diskutil's own validation during formatting.

use crate::error::{ProvisionError, Result};
use crate::models::{SourceImage, TargetDevice};
use crate::system::{tools, ToolRunner};
use std::path::PathBuf;

/// Expand a leading `~` to the home directory.
///
/// Only `~` and `~/...` are expanded; `~user` forms and tildes elsewhere in
/// the path are left alone.
pub fn expand_home(raw: &str) -> String {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return raw.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy().trim_end_matches('/'), rest),
        None => {
            log::warn!("[Input] Cannot determine home directory, leaving '{}' unexpanded", raw);
            raw.to_string()
        }
    }
}

/// Resolve the operator's image path into a `SourceImage`.
///
/// # Errors
/// * `InvalidInput` if the path does not end in `.<extension>`
/// * `NotFound` if nothing exists at the path
pub fn resolve_source_image(raw_path: &str, extension: &str) -> Result<SourceImage> {
    let expanded = expand_home(raw_path.trim());
    let suffix = format!(".{}", extension);

    if !expanded.ends_with(&suffix) {
        return Err(ProvisionError::InvalidInput(format!(
            "file is not an ISO: {}",
            expanded
        )));
    }

    let mut path = PathBuf::from(&expanded);
    if !path.exists() {
        return Err(ProvisionError::NotFound(format!(
            "ISO file {}",
            path.display()
        )));
    }

    if path.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            path = cwd.join(path);
        }
    }

    log::info!("[Input] Source image: {}", path.display());
    Ok(SourceImage { path })
}

/// Resolve the operator's device identifier into a `TargetDevice`.
///
/// # Errors
/// * `InvalidInput` unless the identifier is `<raw_disk_prefix><suffix>` with
///   a non-empty suffix free of whitespace
pub fn resolve_target_device(raw_identifier: &str, raw_disk_prefix: &str) -> Result<TargetDevice> {
    let identifier = raw_identifier.trim();

    let suffix = identifier.strip_prefix(raw_disk_prefix).ok_or_else(|| {
        ProvisionError::InvalidInput(format!("invalid device identifier: {}", identifier))
    })?;

    if suffix.is_empty() || suffix.chars().any(char::is_whitespace) {
        return Err(ProvisionError::InvalidInput(format!(
            "invalid device identifier: {}",
            identifier
        )));
    }

    log::info!("[Input] Target device: {}", identifier);
    Ok(TargetDevice {
        identifier: identifier.to_string(),
    })
}

/// Show attached disks to the operator before the device prompt.
///
/// Informational only: a failing `diskutil list` is reported as a warning
/// and the operator can still type an identifier they know.
pub async fn list_disks(runner: &dyn ToolRunner) {
    crate::log_parsed!("Listing available disks:");
    if let Err(e) = runner.run(tools::list_disks()).await {
        log::warn!("failed to list disks: {}", e);
    }
}
