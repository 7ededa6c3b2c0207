//! Knob assignments.

use crate::error::KnobError;
use crate::tree::unflatten;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Values chosen for some (partial) or all (full) knobs of a space, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(BTreeMap<String, i64>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<i64> {
        self.0.get(path).copied()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: i64) -> Option<i64> {
        self.0.insert(path.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(path, value)| (path.as_str(), *value))
    }

    /// Overwrite the entries present in `partial`; everything else is kept.
    pub fn merge(&mut self, partial: &Config) {
        for (path, value) in &partial.0 {
            self.0.insert(path.clone(), *value);
        }
    }

    /// `base` with this config's entries laid over it.
    pub fn completed_from(&self, base: &Config) -> Config {
        let mut full = base.clone();
        full.merge(self);
        full
    }

    /// Nested `function -> operator -> parameter` document read by the lowering pass.
    pub fn to_nested(&self) -> Result<Value, KnobError> {
        unflatten(&self.0)
    }

    pub fn as_map(&self) -> &BTreeMap<String, i64> {
        &self.0
    }
}

impl From<BTreeMap<String, i64>> for Config {
    fn from(values: BTreeMap<String, i64>) -> Self {
        Self(values)
    }
}

impl FromIterator<(String, i64)> for Config {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Config {
    type Item = (String, i64);
    type IntoIter = std::collections::btree_map::IntoIter<String, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
