//! GOATd USB
//!
//! Builds a bootable Windows 11 installer USB on macOS from an ISO whose
//! `install.wim` is too large for FAT32. The work is done by external tools
//! (`diskutil`, `hdiutil`, `df`, `rsync`, `wimlib-imagex`); this crate
//! sequences them, checks their preconditions and interprets their output.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Values passed between pipeline stages
//! - **config**: Media settings, JSON persistence and validation
//! - **parser**: `df` and `hdiutil` output parsers
//! - **system**: External tool invocation behind the `ToolRunner` trait
//! - **orchestrator**: The 7-stage provisioning pipeline and its state
//! - **ui**: Operator prompts and the erase confirmation
//! - **log_collector**: Session log files behind the `log` facade

// Core foundational modules
pub mod error;
pub mod models;

// Settings file and validation
pub mod config;

// Tool output parsing
pub mod parser;

// External tool abstraction
pub mod system;

// Provisioning pipeline and stage modules
pub mod orchestrator;

// Terminal prompts
pub mod ui;

// Robust, decoupled logging system
pub mod log_collector;

// Re-export the log crate for macro usage
pub use log;

// Re-export log collector for use throughout the system
pub use log_collector::{ConsoleEcho, LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use config::{MediaConfig, SettingsManager};
pub use error::{ConfigError, ErrorKind, ProvisionError, Result, ToolError};
pub use models::{
    AvailableSpace, ProvisionReport, ProvisionRequest, SourceImage, SourceMount, TargetDevice,
    TargetVolume,
};
pub use orchestrator::{exit_code_for, PipelineOutcome, PipelineStage, PipelineState, ProvisioningPipeline};
pub use system::{SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use ui::{ConfirmationGate, OperatorPrompt, TerminalPrompter};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
