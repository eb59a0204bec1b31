//! Per-iteration training history appended to a CSV file.

use std::fs::{self, OpenOptions};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One row of `training_history.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub iteration: usize,
    pub samples: usize,
    pub policy_loss: f64,
    pub value_loss: f64,
    /// Empty when the arena was skipped
    pub arena_score: Option<f64>,
    pub promoted: bool,
    pub elapsed_secs: f64,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl HistoryRecord {
    pub fn new(
        iteration: usize,
        samples: usize,
        policy_loss: f64,
        value_loss: f64,
        arena_score: Option<f64>,
        promoted: bool,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            iteration,
            samples,
            policy_loss,
            value_loss,
            arena_score,
            promoted,
            elapsed_secs,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Appends `record`, writing the header only when the file is new or empty.
pub fn append_history(path: impl AsRef<Path>, record: &HistoryRecord) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

pub fn read_history(path: impl AsRef<Path>) -> Result<Vec<HistoryRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
