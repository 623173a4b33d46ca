//! Argument vectors for every external tool the pipeline drives.
//!
//! Kept free of I/O so each invocation can be checked without a Mac attached.

use super::{OutputMode, ToolCommand, ToolRunner};
use std::path::Path;

pub const DISKUTIL: &str = "diskutil";
pub const HDIUTIL: &str = "hdiutil";
pub const DF: &str = "df";
pub const RSYNC: &str = "rsync";
pub const WIMLIB: &str = "wimlib-imagex";

/// Every program a full run needs on PATH.
pub const REQUIRED_TOOLS: [&str; 5] = [DISKUTIL, HDIUTIL, DF, RSYNC, WIMLIB];

/// `diskutil list`
pub fn list_disks() -> ToolCommand {
    ToolCommand::new(DISKUTIL, OutputMode::Stream).arg("list")
}

/// `diskutil unmountDisk <device>`
pub fn unmount_disk(device: &str) -> ToolCommand {
    ToolCommand::new(DISKUTIL, OutputMode::Stream)
        .arg("unmountDisk")
        .arg(device)
}

/// `diskutil eraseDisk FAT32 <label> GPT <device>`
pub fn erase_disk(device: &str, label: &str) -> ToolCommand {
    ToolCommand::new(DISKUTIL, OutputMode::Stream).args(["eraseDisk", "FAT32", label, "GPT", device])
}

/// `diskutil eject <volume>`
pub fn eject(volume: &Path) -> ToolCommand {
    ToolCommand::new(DISKUTIL, OutputMode::Stream)
        .arg("eject")
        .arg(volume.to_string_lossy())
}

/// `df -k <path>`
pub fn disk_free(path: &Path) -> ToolCommand {
    ToolCommand::new(DF, OutputMode::Capture)
        .arg("-k")
        .arg(path.to_string_lossy())
}

/// `hdiutil mount <image>`
pub fn mount_image(image: &Path) -> ToolCommand {
    ToolCommand::new(HDIUTIL, OutputMode::Capture)
        .arg("mount")
        .arg(image.to_string_lossy())
}

/// `hdiutil unmount <mount>`
pub fn unmount_image(mount: &Path) -> ToolCommand {
    ToolCommand::new(HDIUTIL, OutputMode::Stream)
        .arg("unmount")
        .arg(mount.to_string_lossy())
}

/// `rsync -avh --progress --exclude <relative> <source>/ <target>/`
///
/// Both directories get a trailing slash so rsync mirrors their contents
/// instead of nesting the source directory inside the target.
pub fn rsync_excluding(source: &Path, target: &Path, excluded_relative: &str) -> ToolCommand {
    ToolCommand::new(RSYNC, OutputMode::Stream).args([
        "-avh".to_string(),
        "--progress".to_string(),
        "--exclude".to_string(),
        excluded_relative.to_string(),
        with_trailing_slash(source),
        with_trailing_slash(target),
    ])
}

/// `wimlib-imagex split <source> <first_chunk> <chunk_mb>`
pub fn wim_split(source: &Path, first_chunk: &Path, chunk_size_mb: u64) -> ToolCommand {
    ToolCommand::new(WIMLIB, OutputMode::Stream)
        .arg("split")
        .arg(source.to_string_lossy())
        .arg(first_chunk.to_string_lossy())
        .arg(chunk_size_mb.to_string())
}

/// `which <tool>`
pub fn which(tool: &str) -> ToolCommand {
    ToolCommand::new("which", OutputMode::Capture).arg(tool)
}

fn with_trailing_slash(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    format!("{}/", rendered.trim_end_matches('/'))
}

/// Names from `tools` that `which` cannot locate.
pub async fn missing_tools(runner: &dyn ToolRunner, tools: &[&str]) -> Vec<String> {
    let mut missing = Vec::new();
    for tool in tools {
        if runner.run(which(tool)).await.is_err() {
            log::warn!("[System] [PREFLIGHT] Required tool not found on PATH: {}", tool);
            missing.push(tool.to_string());
        }
    }
    missing
}
