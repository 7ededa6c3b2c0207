//! Merged trial log across partitions.

use crate::record::TrialRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Gap left between the last `iter` of one partition and the first of the next.
pub const PARTITION_GAP: usize = 2;

#[derive(Debug, Default)]
pub struct ResultAccumulator {
    records: Vec<TrialRecord>,
    next_offset: usize,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one partition's records, shifting their `iter` past everything
    /// already collected.
    pub fn extend(&mut self, mut records: Vec<TrialRecord>) {
        for record in &mut records {
            record.iter += self.next_offset;
        }
        if let Some(last) = records.iter().map(|record| record.iter).max() {
            self.next_offset = last + PARTITION_GAP;
        }
        self.records.extend(records);
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    /// Lowest-time record collected so far; ties keep the earlier one.
    pub fn best(&self) -> Option<&TrialRecord> {
        self.records
            .iter()
            .filter(|record| !record.failed())
            .fold(None, |best: Option<&TrialRecord>, record| match best {
                Some(current) if current.time <= record.time => Some(current),
                _ => Some(record),
            })
    }

    /// Write the log as pretty JSON, creating parent directories.
    pub fn finalize(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let blob = serde_json::to_vec_pretty(&self.records)?;
        fs::write(path, blob).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
