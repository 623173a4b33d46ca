//! Scripted `ToolRunner` that records every invocation.
//!
//! Used to drive the pipeline without touching real disks: the responder
//! closure decides what each command returns and may create files to mimic
//! the tool's side effects.

use super::{ToolCommand, ToolOutput, ToolRunner};
use crate::error::ToolError;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&ToolCommand) -> Result<ToolOutput, ToolError> + Send + Sync;

#[derive(Clone)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<ToolCommand>>>,
    responder: Arc<Responder>,
}

impl RecordingRunner {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ToolCommand) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    {
        RecordingRunner {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Every command succeeds with empty output.
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(ToolOutput::default()))
    }

    /// Commands seen so far, in call order.
    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Whether `program <subcommand> ...` was invoked.
    pub fn invoked(&self, program: &str, subcommand: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c.program == program && c.subcommand() == Some(subcommand))
    }

    /// Whether `program` was invoked with any arguments.
    pub fn invoked_program(&self, program: &str) -> bool {
        self.calls().iter().any(|c| c.program == program)
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, command: ToolCommand) -> BoxFuture<'static, Result<ToolOutput, ToolError>> {
        let result = (self.responder)(&command);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command);
        }
        Box::pin(async move { result })
    }
}

/// Shorthand for a failing exit in responders.
pub fn exit_failure(command: &ToolCommand, code: i32, output: &str) -> ToolError {
    ToolError::NonZeroExit {
        program: command.program.clone(),
        code: Some(code),
        output: output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::OutputMode;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let runner = RecordingRunner::succeeding();
        runner
            .run(ToolCommand::new("diskutil", OutputMode::Stream).arg("list"))
            .await
            .unwrap();
        runner
            .run(ToolCommand::new("df", OutputMode::Capture).arg("-k"))
            .await
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(runner.invoked("diskutil", "list"));
        assert!(runner.invoked_program("df"));
        assert!(!runner.invoked_program("rsync"));
    }

    #[tokio::test]
    async fn test_responder_failure_is_returned() {
        let runner = RecordingRunner::new(|cmd| Err(exit_failure(cmd, 2, "nope")));
        let err = runner
            .run(ToolCommand::new("hdiutil", OutputMode::Capture).arg("mount"))
            .await
            .unwrap_err();
        assert_eq!(err.output(), Some("nope"));
    }
}
