//! UI Module - interactive terminal prompts
//!
//! The pipeline asks for the erase confirmation through `ConfirmationGate`
//! and for its raw inputs through `OperatorPrompt`, so tests can script the
//! whole conversation.

pub mod prompt;

pub use prompt::{is_affirmative, ScriptedPrompt, TerminalPrompter};

use crate::models::TargetDevice;

/// The single cancellation point of a run.
pub trait ConfirmationGate: Send {
    /// Last chance before `device` is erased. `true` only on an explicit yes.
    fn confirm_erase(&mut self, device: &TargetDevice) -> bool;
}

/// Trait for the interactive operator conversation
pub trait OperatorPrompt: ConfirmationGate {
    /// Path to the source ISO, raw as typed.
    fn ask_image_path(&mut self) -> String;

    /// Device identifier, raw as typed. Called after the disk listing.
    fn ask_device(&mut self) -> String;
}
