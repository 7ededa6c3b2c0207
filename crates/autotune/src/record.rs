//! One evaluated candidate in the output log.

use anyhow::{Context, Result};
use knobtune_knobs::Config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A partial config together with how it performed.
///
/// Serialized flat: `{"main.mul.TileSize_M": 4, ..., "time": .., "iter": .., "speedup": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    #[serde(flatten)]
    pub config: Config,
    /// Mean seconds per run; `+inf` when the build or the program failed.
    #[serde(with = "finite_or_null")]
    pub time: f64,
    pub iter: usize,
    /// Baseline time divided by `time`.
    #[serde(with = "finite_or_null")]
    pub speedup: f64,
}

impl TrialRecord {
    pub fn failed(&self) -> bool {
        !self.time.is_finite()
    }
}

/// Read back a log written by [`ResultAccumulator::finalize`](crate::ResultAccumulator::finalize).
pub fn load_log(path: &Path) -> Result<Vec<TrialRecord>> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records = serde_json::from_slice(&data)
        .with_context(|| format!("{} is not a trial log", path.display()))?;
    Ok(records)
}

/// JSON has no infinity: non-finite values are written as `null` and read back as `+inf`.
mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
