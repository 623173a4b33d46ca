//! Pipeline State Management and Stage Tracking
//!
//! **Architecture**:
//! - `PipelineStage`: Enum representing discrete provisioning stages
//! - `PipelineState`: Struct tracking current stage, history and failure
//! - State transitions are driven by `ProvisioningPipeline`

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Stage enumeration - discrete states in the provisioning lifecycle.
///
/// The pipeline only ever moves forward; `Aborted` is the single failure
/// terminal and `Cancelled` records an operator "no" at the erase prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Init,
    /// Image and device validated
    Resolved,
    /// Target erased and relabelled
    Formatted,
    /// Free space read from the new volume
    Verified,
    /// Image mounted, mount point discovered
    Mounted,
    /// Tree copied minus the oversized object
    Transferred,
    /// Oversized object written as chunks
    Split,
    /// Source unmounted and target ejected (best-effort)
    TornDown,
    /// Operator declined the destructive step
    Cancelled,
    /// Fatal error in stages 1-6
    Aborted,
}

impl PipelineStage {
    /// Get the human-readable name for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Init => "init",
            PipelineStage::Resolved => "resolved",
            PipelineStage::Formatted => "formatted",
            PipelineStage::Verified => "verified",
            PipelineStage::Mounted => "mounted",
            PipelineStage::Transferred => "transferred",
            PipelineStage::Split => "split",
            PipelineStage::TornDown => "torn-down",
            PipelineStage::Cancelled => "cancelled",
            PipelineStage::Aborted => "aborted",
        }
    }

    /// Get all valid stage transitions FROM this stage.
    pub fn valid_next_stages(&self) -> Vec<PipelineStage> {
        match self {
            PipelineStage::Init => vec![PipelineStage::Resolved, PipelineStage::Aborted],
            PipelineStage::Resolved => vec![
                PipelineStage::Formatted,
                PipelineStage::Cancelled,
                PipelineStage::Aborted,
            ],
            PipelineStage::Formatted => vec![PipelineStage::Verified, PipelineStage::Aborted],
            PipelineStage::Verified => vec![PipelineStage::Mounted, PipelineStage::Aborted],
            PipelineStage::Mounted => vec![PipelineStage::Transferred, PipelineStage::Aborted],
            PipelineStage::Transferred => vec![PipelineStage::Split, PipelineStage::Aborted],
            // Teardown never fails the run
            PipelineStage::Split => vec![PipelineStage::TornDown],
            PipelineStage::TornDown | PipelineStage::Cancelled | PipelineStage::Aborted => vec![],
        }
    }

    /// Check if a transition to the given stage is valid.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        self.valid_next_stages().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_next_stages().is_empty()
    }
}

/// Provisioning state snapshot for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Current stage
    pub stage: PipelineStage,

    /// Every stage entered, in order, starting with Init
    pub history: Vec<PipelineStage>,

    /// Run start timestamp
    pub start_time: SystemTime,

    /// Last stage update timestamp
    pub last_update_time: SystemTime,

    /// Error message if the run aborted
    pub error: Option<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        let now = SystemTime::now();
        PipelineState {
            stage: PipelineStage::Init,
            history: vec![PipelineStage::Init],
            start_time: now,
            last_update_time: now,
            error: None,
        }
    }

    /// Attempt to transition to the next stage.
    pub fn transition_to(&mut self, next: PipelineStage) -> Result<(), String> {
        if !self.stage.can_transition_to(next) {
            return Err(format!(
                "Invalid stage transition: {} -> {}",
                self.stage.as_str(),
                next.as_str()
            ));
        }
        self.stage = next;
        self.history.push(next);
        self.last_update_time = SystemTime::now();
        Ok(())
    }

    /// Record an error and mark the run as aborted.
    pub fn record_error(&mut self, error: String) {
        self.error = Some(error);
        if self.stage != PipelineStage::Aborted {
            self.stage = PipelineStage::Aborted;
            self.history.push(PipelineStage::Aborted);
        }
        self.last_update_time = SystemTime::now();
    }

    /// Get time elapsed since the run started.
    pub fn elapsed_since_start(&self) -> Result<std::time::Duration, std::time::SystemTimeError> {
        self.start_time.elapsed()
    }
}
