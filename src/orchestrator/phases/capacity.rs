//! Stage 3: Capacity Verifier - free space on the freshly formatted volume.
//!
//! The figure is advisory unless `enforce_capacity` is set, in which case the
//! pipeline compares it against the mounted source tree before copying.

use crate::error::{ProvisionError, Result};
use crate::models::{AvailableSpace, TargetVolume};
use crate::parser::{DfAvailableParser, OutputParser};
use crate::system::{tools, ToolRunner};
use std::fs;
use std::path::Path;

/// Query `df -k` for the volume and convert the available KiB to bytes.
///
/// # Errors
/// * `ParseError` if `df` fails or its output does not match the expected layout
pub async fn available_bytes(runner: &dyn ToolRunner, volume: &TargetVolume) -> Result<AvailableSpace> {
    let output = runner
        .run(tools::disk_free(volume.path()))
        .await
        .map_err(|e| ProvisionError::ParseError(format!("failed to check USB space: {}", e.with_output())))?;

    let kib = DfAvailableParser.parse(&output.combined())?;
    let space = AvailableSpace::from_kib(kib)
        .ok_or_else(|| ProvisionError::ParseError(format!("available space out of range: {} KiB", kib)))?;
    crate::log_parsed!("Available space on USB: {}", space);
    Ok(space)
}

/// Total size in bytes of every regular file under `root`.
///
/// Symlinks are counted by their own size and never followed, so a link
/// loop inside an image cannot recurse forever.
pub fn source_tree_size(root: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = fs::symlink_metadata(entry.path())?;
            if metadata.is_dir() {
                pending.push(entry.path());
            } else {
                total += metadata.len();
            }
        }
    }

    Ok(total)
}

/// Fail with `InsufficientSpace` when `required` exceeds what is available.
pub fn check_capacity(required: u64, available: AvailableSpace) -> Result<()> {
    let available = available.bytes.max(0) as u64;
    if required > available {
        return Err(ProvisionError::InsufficientSpace { required, available });
    }
    log::info!(
        "[Capacity] Source needs {} MB of {} MB available",
        required / (1024 * 1024),
        available / (1024 * 1024)
    );
    Ok(())
}
