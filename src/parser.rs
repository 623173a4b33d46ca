//! Parsers for external tool text output.
//!
//! `df` and `hdiutil` output is an unversioned wire contract: these parsers
//! hard-code its layout. Each one sits behind `OutputParser` so a changed tool
//! format means swapping one implementation. Golden outputs live in
//! `tests/fixtures/`.

use crate::error::ProvisionError;

/// Narrow interface over one tool's output format.
pub trait OutputParser {
    type Output;

    fn parse(&self, raw: &str) -> Result<Self::Output, ProvisionError>;
}

/// `df -k` parser: available KiB from the 4th field of the second line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfAvailableParser;

impl OutputParser for DfAvailableParser {
    /// Available space in KiB
    type Output = i64;

    fn parse(&self, raw: &str) -> Result<i64, ProvisionError> {
        let lines: Vec<&str> = raw.split('\n').collect();
        if lines.len() < 2 {
            return Err(ProvisionError::ParseError(format!(
                "invalid df output: {}",
                raw
            )));
        }

        let fields: Vec<&str> = lines[1].split_whitespace().collect();
        if fields.len() < 4 {
            return Err(ProvisionError::ParseError(format!(
                "invalid df fields: {}",
                lines[1]
            )));
        }

        let kib = fields[3].parse::<i64>().map_err(|e| {
            ProvisionError::ParseError(format!(
                "failed to parse available space '{}': {}",
                fields[3], e
            ))
        })?;

        // Must convert to bytes without overflowing i64
        if kib < 0 || kib.checked_mul(1024).is_none() {
            return Err(ProvisionError::ParseError(format!(
                "available space out of range: {}",
                fields[3]
            )));
        }
        Ok(kib)
    }
}

/// `hdiutil mount` parser: first token starting with the volume-root prefix.
#[derive(Debug, Clone)]
pub struct MountPointParser {
    prefix: String,
}

impl MountPointParser {
    /// `prefix` is the volume root with a trailing slash, e.g. `/Volumes/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        MountPointParser {
            prefix: prefix.into(),
        }
    }

    /// Every volume token in output order.
    pub fn scan(&self, raw: &str) -> Vec<String> {
        raw.lines()
            .flat_map(str::split_whitespace)
            .filter(|token| token.starts_with(&self.prefix))
            .map(str::to_string)
            .collect()
    }
}

impl OutputParser for MountPointParser {
    type Output = String;

    fn parse(&self, raw: &str) -> Result<String, ProvisionError> {
        self.scan(raw).into_iter().next().ok_or_else(|| {
            ProvisionError::MountPointNotFound(format!(
                "could not find ISO mount point in output: {}",
                raw
            ))
        })
    }
}
