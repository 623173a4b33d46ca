//! Unified error type hierarchy for GOATd USB
//!
//! Provides structured error handling with ProvisionError (pipeline stages),
//! ToolError (external subprocess failures) and ConfigError (settings file).

use std::io;
use thiserror::Error;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Failure of a single external tool invocation.
///
/// Stages never surface this directly; each one folds it into its own
/// `ProvisionError` kind so the operator sees which step broke.
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// The program could not be started at all (missing binary, permissions)
    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// The program ran and exited unsuccessfully
    #[error("'{program}' exited with {}", exit_description(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        output: String,
    },

    /// The program exceeded the configured per-call timeout
    #[error("'{program}' timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    /// Reading the program's output failed
    #[error("I/O error while running '{program}': {reason}")]
    Io { program: String, reason: String },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

impl ToolError {
    /// Captured output attached to the failure, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            ToolError::NonZeroExit { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }

    /// Render the error together with the captured output, the way the
    /// stages report it to the operator.
    pub fn with_output(&self) -> String {
        match self.output() {
            Some(output) => format!("{}, output: {}", self, output.trim_end()),
            None => self.to_string(),
        }
    }
}

/// Stable tag for each provisioning failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    UnmountFailed,
    FormatFailed,
    ParseError,
    MountFailed,
    MountPointNotFound,
    TransferFailed,
    SourceObjectMissing,
    SplitFailed,
    InsufficientSpace,
    Config,
}

/// Pipeline errors for stages 1-6. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to unmount target: {0}")]
    UnmountFailed(String),

    #[error("Failed to format target: {0}")]
    FormatFailed(String),

    #[error("Unexpected tool output: {0}")]
    ParseError(String),

    #[error("Failed to mount image: {0}")]
    MountFailed(String),

    #[error("Mount point not found: {0}")]
    MountPointNotFound(String),

    #[error("Failed to copy files: {0}")]
    TransferFailed(String),

    #[error("Oversized object missing from source: {0}")]
    SourceObjectMissing(String),

    #[error("Failed to split oversized object: {0}")]
    SplitFailed(String),

    #[error("Insufficient space on target: {required} bytes required, {available} bytes available")]
    InsufficientSpace { required: u64, available: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ProvisionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProvisionError::NotFound(_) => ErrorKind::NotFound,
            ProvisionError::UnmountFailed(_) => ErrorKind::UnmountFailed,
            ProvisionError::FormatFailed(_) => ErrorKind::FormatFailed,
            ProvisionError::ParseError(_) => ErrorKind::ParseError,
            ProvisionError::MountFailed(_) => ErrorKind::MountFailed,
            ProvisionError::MountPointNotFound(_) => ErrorKind::MountPointNotFound,
            ProvisionError::TransferFailed(_) => ErrorKind::TransferFailed,
            ProvisionError::SourceObjectMissing(_) => ErrorKind::SourceObjectMissing,
            ProvisionError::SplitFailed(_) => ErrorKind::SplitFailed,
            ProvisionError::InsufficientSpace { .. } => ErrorKind::InsufficientSpace,
            ProvisionError::Config(_) => ErrorKind::Config,
        }
    }

    /// Get a user-facing error message suitable for terminal display
    pub fn user_message(&self) -> String {
        match self {
            ProvisionError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            ProvisionError::NotFound(msg) => format!("{} does not exist", msg),
            ProvisionError::UnmountFailed(msg) => {
                format!("Could not unmount the USB device ({}). Close any open files on it and retry.", msg)
            }
            ProvisionError::FormatFailed(msg) => {
                format!("Formatting failed ({}). The device may be left without a usable partition table.", msg)
            }
            ProvisionError::ParseError(msg) => format!("Could not understand tool output: {}", msg),
            ProvisionError::MountFailed(msg) => format!("Could not mount the ISO: {}", msg),
            ProvisionError::MountPointNotFound(msg) => {
                format!("The ISO was mounted but its mount point could not be located: {}", msg)
            }
            ProvisionError::TransferFailed(msg) => format!("Copying ISO files failed: {}", msg),
            ProvisionError::SourceObjectMissing(msg) => {
                format!("The ISO does not contain the expected archive: {}", msg)
            }
            ProvisionError::SplitFailed(msg) => {
                format!("Splitting the archive failed: {}. Is wimlib installed?", msg)
            }
            ProvisionError::InsufficientSpace { required, available } => format!(
                "The USB device is too small: {} MB needed, {} MB available",
                required / (1024 * 1024),
                available / (1024 * 1024)
            ),
            ProvisionError::Config(err) => format!("Settings error: {}", err),
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;
