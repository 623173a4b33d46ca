//! Stage 4: Source Mounter - attach the ISO and find where it landed.

use crate::error::{ProvisionError, Result};
use crate::models::{SourceImage, SourceMount};
use crate::parser::{MountPointParser, OutputParser};
use crate::system::{tools, ToolRunner};
use std::path::PathBuf;

/// Mount the image and return the first volume path printed by `hdiutil`.
///
/// Only the first volume token is honoured. A multi-volume image would print
/// several; the extras are logged and ignored.
///
/// # Errors
/// * `MountFailed` if `hdiutil mount` fails
/// * `MountPointNotFound` if no volume token appears or the path is missing
pub async fn mount_image(
    runner: &dyn ToolRunner,
    image: &SourceImage,
    volume_prefix: &str,
) -> Result<SourceMount> {
    crate::log_parsed!("Mounting ISO...");
    let output = runner
        .run(tools::mount_image(image.path()))
        .await
        .map_err(|e| ProvisionError::MountFailed(e.with_output()))?;

    let combined = output.combined();
    let parser = MountPointParser::new(volume_prefix);
    let first = parser.parse(&combined)?;

    let extra = parser.scan(&combined).len().saturating_sub(1);
    if extra > 0 {
        log::warn!(
            "image reported {} additional volume(s); only {} will be used",
            extra,
            first
        );
    }

    let path = PathBuf::from(&first);
    if !path.exists() {
        return Err(ProvisionError::MountPointNotFound(format!(
            "mount point {} does not exist",
            first
        )));
    }

    crate::log_parsed!("ISO mounted at: {}", path.display());
    Ok(SourceMount { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::system::recording::exit_failure;
    use crate::system::{RecordingRunner, ToolOutput};
    use tempfile::TempDir;

    fn image() -> SourceImage {
        SourceImage {
            path: PathBuf::from("/tmp/Win11.iso"),
        }
    }

    #[tokio::test]
    async fn test_mount_discovers_existing_volume() {
        let temp_dir = TempDir::new().unwrap();
        let volume_root = temp_dir.path().join("Volumes");
        let mount = volume_root.join("CCCOMA_X64FRE");
        std::fs::create_dir_all(&mount).unwrap();

        let stdout = format!("/dev/disk5\t\t\t{}\n", mount.display());
        let runner = RecordingRunner::new(move |_| Ok(ToolOutput::from_stdout(stdout.clone())));
        let prefix = format!("{}/", volume_root.display());

        let found = mount_image(&runner, &image(), &prefix).await.unwrap();
        assert_eq!(found.path, mount);
        assert_eq!(runner.calls()[0].args, vec!["mount", "/tmp/Win11.iso"]);
    }

    #[tokio::test]
    async fn test_mount_tool_failure() {
        let runner = RecordingRunner::new(|cmd| Err(exit_failure(cmd, 1, "hdiutil: mount failed - image not recognized")));
        let err = mount_image(&runner, &image(), "/Volumes/").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MountFailed);
        assert!(err.to_string().contains("image not recognized"));
    }

    #[tokio::test]
    async fn test_mount_point_absent_from_output() {
        let runner = RecordingRunner::new(|_| Ok(ToolOutput::from_stdout("/dev/disk5\tattached\n")));
        let err = mount_image(&runner, &image(), "/Volumes/").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MountPointNotFound);
    }

    #[tokio::test]
    async fn test_mount_point_missing_on_disk() {
        let runner = RecordingRunner::new(|_| {
            Ok(ToolOutput::from_stdout("/dev/disk5\t/goatd-usb-missing/Volumes/GONE\n"))
        });
        let err = mount_image(&runner, &image(), "/goatd-usb-missing/Volumes/")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MountPointNotFound);
    }
}
