//! Durable, append-only attempt history
//!
//! One record file per attempt, `attempt_{n}_{YYYYMMDD_HHMMSS}.py`, holding a
//! header marker, the candidate source, and a trailing verdict block. The
//! ledger is the loop's only durable state: records are fsynced before the
//! loop moves on, and the resume point is rediscovered on start-up by taking
//! the numerically highest attempt across existing records.

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

const RECORD_HEADER: &str = "# Generated candidate";
const VERDICT_MARKER: &str = "# Test result / Score:";

/// A fully decided attempt, ready to be recorded. Immutable once written.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub number: u32,
    pub code: String,
    pub verdict: String,
}

impl Attempt {
    pub fn new(number: u32, code: impl Into<String>, verdict: impl Into<String>) -> Self {
        Self {
            number,
            code: code.into(),
            verdict: verdict.into(),
        }
    }
}

pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    /// Open (creating if needed) the ledger directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log folder {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Durably record an attempt. The file is flushed and fsynced before this
    /// returns so a crash afterwards cannot lose it.
    pub fn append(&self, attempt: &Attempt) -> Result<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self
            .dir
            .join(format!("attempt_{}_{}.py", attempt.number, timestamp));

        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create attempt record {}", path.display()))?;
        let body = format!(
            "{}\n{}\n\n{}\n{}\n",
            RECORD_HEADER, attempt.code, VERDICT_MARKER, attempt.verdict
        );
        file.write_all(body.as_bytes())
            .with_context(|| format!("Failed to write attempt record {}", path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync attempt record {}", path.display()))?;
        Ok(path)
    }

    /// Find the resume point: the highest recorded attempt number and its
    /// candidate source. `(0, None)` when nothing has been recorded yet.
    pub fn resume(&self) -> Result<(u32, Option<String>)> {
        let pattern = Regex::new(r"^attempt_(\d+)_\d{8}_\d{6}\.py$").expect("static regex");

        let mut best: Option<(u32, String, PathBuf)> = None;
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((0, None)),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to list log folder {}", self.dir.display())
                })
            }
        };

        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to list log folder {}", self.dir.display()))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(caps) = pattern.captures(&name) else {
                continue;
            };
            let Ok(number) = caps[1].parse::<u32>() else {
                continue;
            };
            // Ties on number (same attempt re-recorded) resolve to the
            // lexically latest file name, i.e. the newest timestamp.
            let replace = match &best {
                None => true,
                Some((n, existing, _)) => number > *n || (number == *n && name > *existing),
            };
            if replace {
                best = Some((number, name, entry.path()));
            }
        }

        let Some((number, _, path)) = best else {
            return Ok((0, None));
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read attempt record {}", path.display()))?;
        Ok((number, Some(extract_code_section(&content))))
    }
}

/// Pull the candidate source back out of a record: everything between the
/// header line and the verdict marker.
fn extract_code_section(record: &str) -> String {
    let body = record
        .strip_prefix(RECORD_HEADER)
        .map(|rest| rest.trim_start_matches('\n'))
        .unwrap_or(record);
    match body.find(VERDICT_MARKER) {
        Some(idx) => body[..idx].trim_end().to_string(),
        None => body.trim_end().to_string(),
    }
}
