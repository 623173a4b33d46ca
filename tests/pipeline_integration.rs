//! End-to-end provisioning runs against a recording `ToolRunner`.
//!
//! The volume root is a temp directory standing in for `/Volumes`; tool
//! side effects (the mounted ISO tree, split chunks) are created on disk by
//! the responders so every filesystem check in the pipeline runs for real.

use goatd_usb::error::ErrorKind;
use goatd_usb::system::recording::exit_failure;
use goatd_usb::system::{RecordingRunner, ToolCommand, ToolOutput};
use goatd_usb::ui::ScriptedPrompt;
use goatd_usb::{
    exit_code_for, MediaConfig, PipelineOutcome, PipelineStage, ProvisionRequest,
    ProvisioningPipeline, ToolError,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const GIB: u64 = 1024 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

/// Scratch layout: `<tmp>/home/Downloads/Win11.iso`, `<tmp>/Volumes/{WINUSB,CCCOMA_X64FRE}`.
struct Workspace {
    temp: TempDir,
    config: MediaConfig,
}

impl Workspace {
    fn new(install_wim_bytes: Option<u64>) -> Self {
        let temp = TempDir::new().unwrap();
        let downloads = temp.path().join("home/Downloads");
        fs::create_dir_all(&downloads).unwrap();
        File::create(downloads.join("Win11.iso")).unwrap();

        let volumes = temp.path().join("Volumes");
        let iso_root = volumes.join("CCCOMA_X64FRE");
        fs::create_dir_all(iso_root.join("sources")).unwrap();
        fs::create_dir_all(iso_root.join("efi/boot")).unwrap();
        fs::create_dir_all(volumes.join("WINUSB")).unwrap();
        fs::write(iso_root.join("setup.exe"), b"MZ").unwrap();
        fs::write(iso_root.join("efi/boot/bootx64.efi"), b"efi").unwrap();

        if let Some(bytes) = install_wim_bytes {
            // Sparse: the split responder only looks at the length
            let wim = File::create(iso_root.join("sources/install.wim")).unwrap();
            wim.set_len(bytes).unwrap();
        }

        let config = MediaConfig {
            volume_root: volumes,
            ..MediaConfig::default()
        };
        Workspace { temp, config }
    }

    fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    fn image(&self) -> String {
        self.home().join("Downloads/Win11.iso").to_string_lossy().into_owned()
    }

    fn iso_root(&self) -> PathBuf {
        self.temp.path().join("Volumes/CCCOMA_X64FRE")
    }

    fn usb_root(&self) -> PathBuf {
        self.temp.path().join("Volumes/WINUSB")
    }
}

/// Mimic `wimlib-imagex split <src> <dst.swm> <mb>`: write one file per chunk.
fn fake_split(cmd: &ToolCommand) -> Result<ToolOutput, ToolError> {
    let source = Path::new(&cmd.args[1]);
    let first = PathBuf::from(&cmd.args[2]);
    let chunk_mb: u64 = cmd.args[3].parse().unwrap();

    let size = fs::metadata(source).unwrap().len();
    let chunk_count = size.div_ceil(chunk_mb * MIB).max(1);

    let dir = first.parent().unwrap();
    let stem = first.file_stem().unwrap().to_string_lossy().into_owned();
    for index in 1..=chunk_count {
        let name = if index == 1 {
            format!("{}.swm", stem)
        } else {
            format!("{}{}.swm", stem, index)
        };
        File::create(dir.join(name)).unwrap();
    }
    Ok(ToolOutput::from_stdout(format!(
        "Splitting WIM: {} bytes into {} parts\n",
        size, chunk_count
    )))
}

/// Responder for a healthy Mac: 14 GB free, ISO mounted under the volume root.
fn healthy_mac(ws: &Workspace) -> RecordingRunner {
    let iso_root = ws.iso_root();
    let usb_root = ws.usb_root();
    RecordingRunner::new(move |cmd| match (cmd.program.as_str(), cmd.subcommand()) {
        ("df", _) => Ok(ToolOutput::from_stdout(format!(
            "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
             /dev/disk4s2 15000000 0 {} 0% {}\n",
            14 * GIB / 1024,
            usb_root.display()
        ))),
        ("hdiutil", Some("mount")) => Ok(ToolOutput::from_stdout(format!(
            "/dev/disk5          \t                               \t{}\n",
            iso_root.display()
        ))),
        ("rsync", _) => Ok(ToolOutput::default()),
        ("wimlib-imagex", _) => fake_split(cmd),
        // Teardown is allowed to fail without affecting the run
        ("hdiutil", Some("unmount")) => Err(exit_failure(cmd, 16, "hdiutil: unmount failed - Resource busy")),
        ("diskutil", Some("eject")) => Err(exit_failure(cmd, 1, "Volume failed to eject")),
        _ => Ok(ToolOutput::default()),
    })
}

#[tokio::test]
async fn test_end_to_end_windows_11_usb() {
    let ws = Workspace::new(Some(5 * GIB));
    let runner = healthy_mac(&ws);
    let mut pipeline =
        ProvisioningPipeline::new(ws.config.clone(), Arc::new(runner.clone())).unwrap();

    // The only test in this binary that reads HOME
    std::env::set_var("HOME", ws.home());
    let mut prompt = ScriptedPrompt::new(["~/Downloads/Win11.iso", "/dev/disk4", "y"]);

    let result = pipeline.run_interactive(&mut prompt).await;
    assert_eq!(exit_code_for(&result), 0);

    let report = match result.unwrap() {
        PipelineOutcome::Completed(report) => report,
        PipelineOutcome::Aborted => panic!("run was aborted"),
    };

    assert_eq!(report.image.path().to_string_lossy(), ws.image());
    assert_eq!(report.device.as_str(), "/dev/disk4");
    assert_eq!(report.target_volume.path(), ws.usb_root());
    assert_eq!(report.source_mount.path(), ws.iso_root());
    assert_eq!(report.available.bytes as u64, 14 * GIB);

    // 5 GiB at 4000 MB per chunk
    assert!(report.chunks.len() >= 2);
    for chunk in &report.chunks {
        assert_eq!(chunk.parent().unwrap(), ws.usb_root().join("sources"));
        assert!(chunk.exists());
    }

    assert_eq!(report.teardown_warnings.len(), 2);
    assert_eq!(pipeline.current_stage(), PipelineStage::TornDown);

    let calls = runner.calls();
    let programs: Vec<String> = calls
        .iter()
        .map(|c| format!("{} {}", c.program, c.subcommand().unwrap_or("")))
        .collect();
    assert_eq!(
        programs,
        vec![
            "diskutil list",
            "diskutil unmountDisk",
            "diskutil eraseDisk",
            "df -k",
            "hdiutil mount",
            "rsync -avh",
            "wimlib-imagex split",
            "hdiutil unmount",
            "diskutil eject",
        ]
    );

    let erase = &calls[2];
    assert_eq!(erase.args, vec!["eraseDisk", "FAT32", "WINUSB", "GPT", "/dev/disk4"]);

    let rsync = calls.iter().find(|c| c.program == "rsync").unwrap();
    assert!(rsync
        .args
        .windows(2)
        .any(|w| w[0] == "--exclude" && w[1] == "sources/install.wim"));
    assert!(rsync.args.iter().any(|a| a.ends_with("CCCOMA_X64FRE/")));
}

#[tokio::test]
async fn test_declined_confirmation_is_clean_abort() {
    let ws = Workspace::new(Some(GIB));
    let runner = healthy_mac(&ws);

    for answer in ["n", "", "yes"] {
        let mut pipeline =
            ProvisioningPipeline::new(ws.config.clone(), Arc::new(runner.clone())).unwrap();
        let mut prompt = ScriptedPrompt::new([answer]);
        let result = pipeline
            .run(ProvisionRequest::new(ws.image(), "/dev/disk4"), &mut prompt)
            .await;

        assert!(matches!(result, Ok(PipelineOutcome::Aborted)), "answer: {:?}", answer);
        assert_eq!(exit_code_for(&result), 0);
        assert_eq!(pipeline.current_stage(), PipelineStage::Cancelled);
    }

    assert!(!runner.invoked("diskutil", "unmountDisk"));
    assert!(!runner.invoked("diskutil", "eraseDisk"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_missing_install_wim_aborts_after_transfer() {
    let ws = Workspace::new(None);
    let runner = healthy_mac(&ws);
    let mut pipeline =
        ProvisioningPipeline::new(ws.config.clone(), Arc::new(runner.clone())).unwrap();
    let mut prompt = ScriptedPrompt::new(["y"]);

    let result = pipeline
        .run(ProvisionRequest::new(ws.image(), "/dev/disk4"), &mut prompt)
        .await;

    assert_eq!(exit_code_for(&result), 1);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::SourceObjectMissing);
    assert!(runner.invoked_program("rsync"));
    assert!(!runner.invoked_program("wimlib-imagex"));
    assert_eq!(pipeline.current_stage(), PipelineStage::Aborted);
    assert_eq!(
        pipeline.state().history.last(),
        Some(&PipelineStage::Aborted)
    );
}

#[tokio::test]
async fn test_unmount_failure_never_formats() {
    let ws = Workspace::new(Some(GIB));
    let runner = RecordingRunner::new(|cmd| match cmd.subcommand() {
        Some("unmountDisk") => Err(exit_failure(cmd, 1, "Unmount of disk4 failed: at least one volume could not be unmounted")),
        _ => Ok(ToolOutput::default()),
    });
    let mut pipeline =
        ProvisioningPipeline::new(ws.config.clone(), Arc::new(runner.clone())).unwrap();
    let mut prompt = ScriptedPrompt::new(["y"]);

    let err = pipeline
        .run(ProvisionRequest::new(ws.image(), "/dev/disk4"), &mut prompt)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnmountFailed);
    assert!(err.to_string().contains("could not be unmounted"));
    assert!(!runner.invoked("diskutil", "eraseDisk"));
}

#[tokio::test]
async fn test_unparseable_df_aborts_before_mount() {
    let ws = Workspace::new(Some(GIB));
    let runner = RecordingRunner::new(|cmd| match cmd.program.as_str() {
        "df" => Ok(ToolOutput::from_stdout("Filesystem 1K-blocks Used Available\n")),
        _ => Ok(ToolOutput::default()),
    });
    let mut pipeline =
        ProvisioningPipeline::new(ws.config.clone(), Arc::new(runner.clone())).unwrap();
    let mut prompt = ScriptedPrompt::new(["y"]);

    let err = pipeline
        .run(ProvisionRequest::new(ws.image(), "/dev/disk4"), &mut prompt)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ParseError);
    assert!(!runner.invoked_program("hdiutil"));
    assert_eq!(pipeline.state().history.last(), Some(&PipelineStage::Aborted));
}

#[tokio::test]
async fn test_image_without_iso_extension_is_rejected() {
    let ws = Workspace::new(Some(GIB));
    let dmg = ws.home().join("Downloads/Win11.dmg");
    File::create(&dmg).unwrap();
    let runner = RecordingRunner::succeeding();
    let mut pipeline =
        ProvisioningPipeline::new(ws.config.clone(), Arc::new(runner.clone())).unwrap();
    let mut prompt = ScriptedPrompt::new(["y"]);

    let result = pipeline
        .run(
            ProvisionRequest::new(dmg.to_string_lossy(), "/dev/disk4"),
            &mut prompt,
        )
        .await;

    assert_eq!(exit_code_for(&result), 1);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
    assert!(prompt.confirmations_requested.is_empty());
    assert!(runner.calls().is_empty());
}
