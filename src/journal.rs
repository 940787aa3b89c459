//! Transition journal.
//!
//! Emitted state changes are appended to a JSON-lines file so a run can be
//! inspected after the fact. The journal records transitions only, never
//! per-frame data. Appending to an existing journal continues its sequence
//! numbers; a malformed line on read is an error, not a silent skip.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::StateChange;

/// One journaled transition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionRecord {
    /// Position in the journal, starting at 0.
    pub seq: u64,
    /// Stream-relative capture time of the triggering frame.
    pub elapsed_ms: u64,
    pub obscured: bool,
    pub smoothed_luma: f64,
}

/// Append-only journal writer.
pub struct Journal {
    path: PathBuf,
    file: File,
    next_seq: u64,
}

impl Journal {
    /// Create the journal at `path`, or continue an existing one.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let next_seq = match read_records(&path) {
            Ok(records) => records.last().map(|r| r.seq + 1).unwrap_or(0),
            Err(e) => return Err(e.context("refusing to append to a corrupt journal")),
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening journal {}", path.display()))?;
        Ok(Self {
            path,
            file,
            next_seq,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one transition and return the record as written.
    pub fn append(&mut self, change: &StateChange) -> Result<TransitionRecord> {
        let record = TransitionRecord {
            seq: self.next_seq,
            elapsed_ms: change.timestamp.as_millis() as u64,
            obscured: change.obscured,
            smoothed_luma: change.smoothed_luma,
        };
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{line}")
            .with_context(|| format!("appending to journal {}", self.path.display()))?;
        self.next_seq += 1;
        Ok(record)
    }
}

/// Read every record in journal order. A missing file is an empty journal.
pub fn read_records(path: &Path) -> Result<Vec<TransitionRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(anyhow!("opening journal {}: {}", path.display(), e)),
    };
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading journal {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: TransitionRecord = serde_json::from_str(&line).with_context(|| {
            format!("journal {}: bad record on line {}", path.display(), index + 1)
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn change(obscured: bool, luma: f64, ms: u64) -> StateChange {
        StateChange {
            obscured,
            smoothed_luma: luma,
            timestamp: Duration::from_millis(ms),
        }
    }

    #[test]
    fn round_trips_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let mut journal = Journal::open(&path).unwrap();
        journal.append(&change(false, 103.2, 100)).unwrap();
        journal.append(&change(true, 18.7, 5300)).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 0);
        assert!(!records[0].obscured);
        assert_eq!(records[1].seq, 1);
        assert!(records[1].obscured);
        assert_eq!(records[1].elapsed_ms, 5300);
    }

    #[test]
    fn reopening_continues_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let mut journal = Journal::open(&path).unwrap();
        journal.append(&change(true, 10.0, 0)).unwrap();
        drop(journal);

        let mut journal = Journal::open(&path).unwrap();
        let record = journal.append(&change(false, 95.0, 1000)).unwrap();
        assert_eq!(record.seq, 1);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_records(&dir.path().join("nope.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn corrupt_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, "{\"seq\":0,\"elapsed_ms\":1,\"obscured\":true,\"smoothed_luma\":2.0}\nnot json\n").unwrap();
        assert!(read_records(&path).is_err());
        // And open() refuses to append after it.
        assert!(Journal::open(&path).is_err());
    }
}
