//! Stage 5: Selective Transfer - mirror the ISO onto the USB minus one object.

use crate::error::{ProvisionError, Result};
use crate::models::{SourceMount, TargetVolume};
use crate::system::{tools, ToolRunner};

/// Copy the mounted tree to the target with `rsync`, skipping `excluded_relative`.
///
/// The mount is re-checked right before the copy rather than trusted from
/// the mount stage. A transfer that dies halfway is one aggregate failure;
/// nothing is kept for resuming.
///
/// # Errors
/// * `NotFound` if the source mount vanished
/// * `TransferFailed` on any non-zero rsync exit
pub async fn copy_excluding(
    runner: &dyn ToolRunner,
    source: &SourceMount,
    target: &TargetVolume,
    excluded_relative: &str,
) -> Result<()> {
    crate::log_parsed!("Copying ISO files to USB (excluding {})...", excluded_relative);

    if !source.path().exists() {
        return Err(ProvisionError::NotFound(format!("source path {}", source)));
    }

    runner
        .run(tools::rsync_excluding(source.path(), target.path(), excluded_relative))
        .await
        .map_err(|e| ProvisionError::TransferFailed(e.with_output()))?;

    log::info!("[Transfer] {} -> {} complete", source, target);
    Ok(())
}
