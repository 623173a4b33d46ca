//! Terminal and scripted implementations of `OperatorPrompt`.

use super::{ConfirmationGate, OperatorPrompt};
use crate::models::TargetDevice;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// The single affirmative token accepted at the erase prompt.
const AFFIRMATIVE: &str = "y";

/// `true` for `y`/`Y` (surrounding whitespace ignored), `false` for anything else.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(AFFIRMATIVE)
}

/// Prompts on stdout, reads answers from stdin.
pub struct TerminalPrompter<R: BufRead + Send = io::BufReader<io::Stdin>> {
    input: R,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter {
            input: io::BufReader::new(io::stdin()),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead + Send> TerminalPrompter<R> {
    pub fn with_input(input: R) -> Self {
        TerminalPrompter { input }
    }

    /// Print `question`, read one line. EOF or a read error yields "".
    fn ask(&mut self, question: &str) -> String {
        print!("{}", question);
        let _ = io::stdout().flush();

        let mut line = String::new();
        if let Err(e) = self.input.read_line(&mut line) {
            log::warn!("failed to read answer: {}", e);
            return String::new();
        }
        line.trim().to_string()
    }
}

impl<R: BufRead + Send> OperatorPrompt for TerminalPrompter<R> {
    fn ask_image_path(&mut self) -> String {
        self.ask("Enter the full path to the Windows 11 ISO (e.g., ~/Downloads/Win11.iso): ")
    }

    fn ask_device(&mut self) -> String {
        self.ask("Enter the USB device identifier (e.g., /dev/disk2): ")
    }
}

impl<R: BufRead + Send> ConfirmationGate for TerminalPrompter<R> {
    fn confirm_erase(&mut self, device: &TargetDevice) -> bool {
        let answer = self.ask(&format!(
            "WARNING: This will erase all data on {}. Continue? (y/N): ",
            device
        ));
        is_affirmative(&answer)
    }
}

/// Pre-recorded answers, consumed in order; missing answers read as "".
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    /// Devices the erase confirmation was requested for
    pub confirmations_requested: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompt {
            answers: answers.into_iter().map(Into::into).collect(),
            confirmations_requested: Vec::new(),
        }
    }

    fn next(&mut self) -> String {
        self.answers.pop_front().unwrap_or_default()
    }
}

impl OperatorPrompt for ScriptedPrompt {
    fn ask_image_path(&mut self) -> String {
        self.next()
    }

    fn ask_device(&mut self) -> String {
        self.next()
    }
}

impl ConfirmationGate for ScriptedPrompt {
    fn confirm_erase(&mut self, device: &TargetDevice) -> bool {
        self.confirmations_requested.push(device.to_string());
        let answer = self.next();
        is_affirmative(&answer)
    }
}
