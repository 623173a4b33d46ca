//! Stage 7: Teardown - unmount the ISO and eject the USB.
//!
//! The medium is complete by the time this runs, so neither step can fail
//! the pipeline. Each is attempted independently.

use crate::models::{SourceMount, TargetVolume};
use crate::system::{tools, ToolRunner};

/// Unmount `source` and eject `target`; returns one warning per failed step.
pub async fn teardown(
    runner: &dyn ToolRunner,
    source: &SourceMount,
    target: &TargetVolume,
) -> Vec<String> {
    let mut warnings = Vec::new();

    crate::log_parsed!("Unmounting ISO...");
    if let Err(e) = runner.run(tools::unmount_image(source.path())).await {
        let warning = format!("failed to unmount ISO: {}", e);
        log::warn!("{}", warning);
        warnings.push(warning);
    }

    crate::log_parsed!("Ejecting USB...");
    if let Err(e) = runner.run(tools::eject(target.path())).await {
        let warning = format!("failed to eject USB: {}", e);
        log::warn!("{}", warning);
        warnings.push(warning);
    }

    warnings
}
