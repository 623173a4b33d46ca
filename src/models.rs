//! Core data types for GOATd USB.
//!
//! Every path-valued entity here is produced by exactly one pipeline stage and
//! only read by the stages after it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Source disk image (ISO) selected by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub path: PathBuf,
}

impl SourceImage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Raw block device identifier, e.g. `/dev/disk4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDevice {
    pub identifier: String,
}

impl TargetDevice {
    pub fn as_str(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for TargetDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Mount path of the freshly formatted target, `<volume_root>/<label>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetVolume {
    pub path: PathBuf,
}

impl TargetVolume {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TargetVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Mount path of the source image as reported by the image mounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMount {
    pub path: PathBuf,
}

impl SourceMount {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SourceMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Free space on the target volume right after formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AvailableSpace {
    pub bytes: i64,
}

impl AvailableSpace {
    /// `None` for a negative count or one whose byte value overflows.
    pub fn from_kib(kib: i64) -> Option<Self> {
        if kib < 0 {
            return None;
        }
        kib.checked_mul(1024).map(|bytes| AvailableSpace { bytes })
    }

    pub fn megabytes(&self) -> i64 {
        self.bytes / (1024 * 1024)
    }
}

impl fmt::Display for AvailableSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MB", self.megabytes())
    }
}

/// Operator-supplied raw inputs, before resolution.
#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub image_path: String,
    pub device_identifier: String,
}

impl ProvisionRequest {
    pub fn new(image_path: impl Into<String>, device_identifier: impl Into<String>) -> Self {
        ProvisionRequest {
            image_path: image_path.into(),
            device_identifier: device_identifier.into(),
        }
    }
}

/// Summary of a completed provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub image: SourceImage,
    pub device: TargetDevice,
    pub target_volume: TargetVolume,
    pub source_mount: SourceMount,
    pub available: AvailableSpace,
    /// Chunk files written by the splitter, in chunk order
    pub chunks: Vec<PathBuf>,
    /// Teardown problems; informational only
    pub teardown_warnings: Vec<String>,
}
