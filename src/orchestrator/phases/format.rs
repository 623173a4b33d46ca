//! Stage 2: Destructive Formatter - unmount and erase the target device.
//!
//! Irreversible. The pipeline only reaches this after the operator confirmed
//! the erase prompt.

use crate::config::MediaConfig;
use crate::error::{ProvisionError, Result};
use crate::models::{TargetDevice, TargetVolume};
use crate::system::{tools, ToolRunner};

/// Unmount every partition of `device`, then erase it as FAT32 on GPT with
/// the configured label.
///
/// Returns `<volume_root>/<label>`. The OS mounts the new volume
/// synchronously during `eraseDisk`, so the path is not re-checked here.
///
/// # Errors
/// * `UnmountFailed` if `diskutil unmountDisk` fails
/// * `FormatFailed` if `diskutil eraseDisk` fails
pub async fn format_target(
    runner: &dyn ToolRunner,
    device: &TargetDevice,
    config: &MediaConfig,
) -> Result<TargetVolume> {
    crate::log_parsed!("Unmounting all partitions on {}...", device);
    runner
        .run(tools::unmount_disk(device.as_str()))
        .await
        .map_err(|e| ProvisionError::UnmountFailed(e.with_output()))?;

    crate::log_parsed!("Formatting {} as FAT32 with GPT...", device);
    runner
        .run(tools::erase_disk(device.as_str(), &config.volume_label))
        .await
        .map_err(|e| ProvisionError::FormatFailed(e.with_output()))?;

    let volume = TargetVolume {
        path: config.target_volume_path(),
    };
    log::info!("[Format] {} formatted, volume expected at {}", device, volume);
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::system::recording::exit_failure;
    use crate::system::RecordingRunner;
    use std::path::PathBuf;

    fn device() -> TargetDevice {
        TargetDevice {
            identifier: "/dev/disk4".to_string(),
        }
    }

    #[tokio::test]
    async fn test_format_unmounts_then_erases() {
        let runner = RecordingRunner::succeeding();
        let volume = format_target(&runner, &device(), &MediaConfig::default())
            .await
            .unwrap();

        assert_eq!(volume.path, PathBuf::from("/Volumes/WINUSB"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["unmountDisk", "/dev/disk4"]);
        assert_eq!(calls[1].subcommand(), Some("eraseDisk"));
    }

    #[tokio::test]
    async fn test_unmount_failure_skips_erase() {
        let runner = RecordingRunner::new(|cmd| Err(exit_failure(cmd, 1, "Resource busy")));
        let err = format_target(&runner, &device(), &MediaConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnmountFailed);
        assert!(err.to_string().contains("Resource busy"));
        assert!(!runner.invoked("diskutil", "eraseDisk"));
    }

    #[tokio::test]
    async fn test_erase_failure() {
        let runner = RecordingRunner::new(|cmd| {
            if cmd.subcommand() == Some("eraseDisk") {
                Err(exit_failure(cmd, 1, ""))
            } else {
                Ok(Default::default())
            }
        });
        let err = format_target(&runner, &device(), &MediaConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatFailed);
    }

    #[tokio::test]
    async fn test_custom_label_and_root() {
        let config = MediaConfig {
            volume_label: "W11".to_string(),
            volume_root: PathBuf::from("/media"),
            ..MediaConfig::default()
        };
        let runner = RecordingRunner::succeeding();
        let volume = format_target(&runner, &device(), &config).await.unwrap();
        assert_eq!(volume.path, PathBuf::from("/media/W11"));
        assert_eq!(runner.calls()[1].args[2], "W11");
    }
}
