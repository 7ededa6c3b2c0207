//! Parameter spaces and candidates.

use crate::error::SearchError;
use std::collections::{BTreeMap, BTreeSet};

/// Values a parameter may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Ordered integers in `[low, high]`.
    Integer { low: i64, high: i64 },
    /// Unordered choices, stored sorted and distinct.
    Categorical(Vec<i64>),
}

impl ParameterKind {
    /// Number of distinct values.
    pub fn cardinality(&self) -> u64 {
        match self {
            ParameterKind::Integer { low, high } if low <= high => {
                high.abs_diff(*low).saturating_add(1)
            }
            ParameterKind::Integer { .. } => 0,
            ParameterKind::Categorical(values) => values.len() as u64,
        }
    }

    /// The `index`-th value in ascending order.
    pub fn value_at(&self, index: u64) -> Option<i64> {
        if index >= self.cardinality() {
            return None;
        }
        match self {
            ParameterKind::Integer { low, .. } => low.checked_add_unsigned(index),
            ParameterKind::Categorical(values) => values.get(index as usize).copied(),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        match self {
            ParameterKind::Integer { low, high } => (*low..=*high).contains(&value),
            ParameterKind::Categorical(values) => values.binary_search(&value).is_ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn integer(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Integer { low, high },
        }
    }

    pub fn categorical<I: IntoIterator<Item = i64>>(name: impl Into<String>, values: I) -> Self {
        let values: BTreeSet<i64> = values.into_iter().collect();
        Self {
            name: name.into(),
            kind: ParameterKind::Categorical(values.into_iter().collect()),
        }
    }
}

/// Ordered list of parameters with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parameter: Parameter) -> Result<(), SearchError> {
        if parameter.kind.cardinality() == 0 {
            return Err(SearchError::EmptyParameter(parameter.name));
        }
        if self.parameters.iter().any(|p| p.name == parameter.name) {
            return Err(SearchError::DuplicateParameter(parameter.name));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Number of distinct points, saturating at `u128::MAX`.
    pub fn size(&self) -> u128 {
        self.parameters.iter().fold(1u128, |acc, parameter| {
            acc.saturating_mul(parameter.kind.cardinality() as u128)
        })
    }

    /// Whether `candidate` assigns every parameter an admissible value.
    pub fn admits(&self, candidate: &Candidate) -> bool {
        candidate.len() == self.parameters.len()
            && self.parameters.iter().all(|parameter| {
                candidate
                    .get(&parameter.name)
                    .is_some_and(|value| parameter.kind.contains(value))
            })
    }
}

/// One point of a [`ParameterSpace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate(BTreeMap<String, i64>);

impl Candidate {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn into_inner(self) -> BTreeMap<String, i64> {
        self.0
    }
}

impl FromIterator<(String, i64)> for Candidate {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
