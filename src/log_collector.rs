//! Decoupled session logging for provisioning runs.
//!
//! Every `log::*` record is handed to a background thread over an unbounded
//! channel and appended to the session's log files; milestones and warnings
//! are also echoed to the terminal synchronously so they interleave correctly
//! with prompts and streamed tool output.
//!
//! # Architecture
//!
//! ```text
//! log::info!/warn!/...        log_parsed!
//!         |                        |
//!    [LogCollector] (log::Log impl, non-blocking)
//!         | (crossbeam channel)
//!   [DiskPersister thread]
//!         |
//! logs/full/<ts>_full.log      (every record)
//! logs/parsed/<ts>_parsed.log  (target "parsed" only)
//! ```

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Target used for operator-facing milestones.
pub const PARSED_TARGET: &str = "parsed";

/// Internal log line or special marker
enum LogMessage {
    /// Regular log line
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// Which session file(s) a line belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogStream {
    /// logs/full only
    Full,
    /// logs/full and logs/parsed
    Parsed,
}

/// Per-user log directory: `<data_local_dir>/goatd-usb/logs`, or `./logs`
/// when no data directory is known.
pub fn get_global_logs_path() -> Result<PathBuf, String> {
    if let Some(data_dir) = dirs::data_local_dir() {
        return Ok(data_dir.join("goatd-usb").join("logs"));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to get current working directory: {}", e))?;
    Ok(cwd.join("logs"))
}

/// Ensure the global logs directory exists
pub fn ensure_logs_dir_exists(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create logs directory: {}", e))?;
    Ok(())
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub stream: LogStream,
    /// Wall-clock time the line was created, `HH:MM:SS.mmm`
    pub timestamp: String,
}

impl LogLine {
    pub fn new(message: String) -> Self {
        LogLine {
            message,
            stream: LogStream::Full,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(message: String) -> Self {
        LogLine {
            stream: LogStream::Parsed,
            ..LogLine::new(message)
        }
    }

    fn formatted(&self) -> String {
        format!("[{}] {}\n", self.timestamp, self.message)
    }
}

/// Session logger; install with `log::set_boxed_logger`.
#[derive(Clone)]
pub struct LogCollector {
    /// crossbeam unbounded: sending never blocks the pipeline
    tx: Sender<LogMessage>,
    full_log_path: PathBuf,
    parsed_log_path: PathBuf,
    /// Echo milestones and warnings to the terminal
    echo: bool,
}

impl LogCollector {
    /// Create the session files under `log_dir` and start the disk persister.
    pub fn new(log_dir: PathBuf, echo: bool) -> Result<Self, String> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        std::fs::create_dir_all(&full_log_dir)
            .map_err(|e| format!("Failed to create full log dir: {}", e))?;
        std::fs::create_dir_all(&parsed_log_dir)
            .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

        let session = Local::now().format("%Y%m%d_%H%M%S");
        let full_log_path = full_log_dir.join(format!("{}_full.log", session));
        let parsed_log_path = parsed_log_dir.join(format!("{}_parsed.log", session));

        let mut full = open_append(&full_log_path)?;
        let mut parsed = open_append(&parsed_log_path)?;

        let (tx, rx) = unbounded::<LogMessage>();

        // OS thread, not a tokio task: records logged during runtime shutdown
        // still reach disk
        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let formatted = line.formatted();
                        let _ = full.write_all(formatted.as_bytes());
                        if line.stream == LogStream::Parsed {
                            let _ = parsed.write_all(formatted.as_bytes());
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = full.flush();
                        let _ = parsed.flush();
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector {
            tx,
            full_log_path,
            parsed_log_path,
            echo,
        })
    }

    pub fn full_log_path(&self) -> &Path {
        &self.full_log_path
    }

    pub fn parsed_log_path(&self) -> &Path {
        &self.parsed_log_path
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Send a simple string log
    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(message.into()));
    }

    /// Send a parsed (high-level) log
    pub fn log_parsed(&self, message: impl Into<String>) {
        self.log_line(LogLine::parsed(message.into()));
    }

    /// Wait for all pending logs to be written to disk
    ///
    /// Sends a flush marker down the channel and blocks until the persister
    /// has processed everything queued before it. Call before exiting.
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))?;
        Ok(())
    }

}

/// Terminal rendering of a record: milestones on stdout, warnings on stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoLine {
    Stdout(String),
    Stderr(String),
}

/// What, if anything, the operator sees for `record`.
pub fn echo_line(record: &Record) -> Option<EchoLine> {
    if record.target() == PARSED_TARGET {
        Some(EchoLine::Stdout(record.args().to_string()))
    } else if record.level() == Level::Warn {
        Some(EchoLine::Stderr(format!("Warning: {}", record.args())))
    } else {
        None
    }
}

fn echo_record(record: &Record) {
    match echo_line(record) {
        Some(EchoLine::Stdout(line)) => println!("{}", line),
        Some(EchoLine::Stderr(line)) => eprintln!("{}", line),
        None => {}
    }
}

/// Terminal-only logger for sessions without a usable log directory.
///
/// Echoes exactly what `LogCollector` would and writes no files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEcho;

impl Log for ConsoleEcho {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            echo_record(record);
        }
    }

    fn flush(&self) {}
}

fn open_append(path: &Path) -> Result<File, String> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))
}

/// Implementation of the `log` crate's Log trait
/// Wires all log::info!(), log::warn!(), log::error!() calls into LogCollector
impl Log for LogCollector {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.echo {
            echo_record(record);
        }

        let message = format!("[{}] {}", record.level(), record.args());
        if record.target() == PARSED_TARGET {
            self.log_parsed(message);
        } else {
            self.log_str(message);
        }
    }

    fn flush(&self) {}
}
