//! A single tunable parameter exposed by the lowering pass.
//!
//! On disk a knob looks like `{"data_type": "int", "data_range": [0, 16]}` or
//! `{"data_type": "int", "values": [1, 2, 4, 8]}`. In memory the two shapes
//! are a [`KnobDomain`], so a knob can never carry both or neither.

use crate::error::KnobError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Element type of a knob. Only [`DataType::Int`] can be searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Int,
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Int => "int",
            DataType::Other(name) => name,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Int)
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        if value == "int" {
            DataType::Int
        } else {
            DataType::Other(value)
        }
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The values a knob may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnobDomain {
    /// Every integer in `[low, high]`, in order.
    Range { low: i64, high: i64 },
    /// A set of distinct integers; consumed in ascending order.
    Values(BTreeSet<i64>),
}

impl KnobDomain {
    /// Smallest value in the domain.
    pub fn lowest(&self) -> i64 {
        match self {
            KnobDomain::Range { low, .. } => *low,
            // Non-empty by construction.
            KnobDomain::Values(values) => values.first().copied().unwrap_or_default(),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        match self {
            KnobDomain::Range { low, high } => (*low..=*high).contains(&value),
            KnobDomain::Values(values) => values.contains(&value),
        }
    }

    /// Number of distinct values.
    pub fn cardinality(&self) -> u64 {
        match self {
            KnobDomain::Range { low, high } => high.abs_diff(*low).saturating_add(1),
            KnobDomain::Values(values) => values.len() as u64,
        }
    }
}

/// A tunable integer knob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKnob", into = "RawKnob")]
pub struct Knob {
    pub data_type: DataType,
    pub domain: KnobDomain,
}

impl Knob {
    /// Integer knob over the inclusive range `[low, high]`.
    pub fn range(low: i64, high: i64) -> Result<Self, KnobError> {
        Self::try_from(RawKnob {
            data_type: DataType::Int,
            data_range: Some([low, high]),
            values: None,
        })
    }

    /// Integer knob over an explicit set of values.
    pub fn values<I: IntoIterator<Item = i64>>(values: I) -> Result<Self, KnobError> {
        Self::try_from(RawKnob {
            data_type: DataType::Int,
            data_range: None,
            values: Some(values.into_iter().collect()),
        })
    }

    /// Value used before any search has run: the lowest bound or entry.
    pub fn default_value(&self) -> i64 {
        self.domain.lowest()
    }
}

/// Wire shape of a knob as written by the lowering pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawKnob {
    data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_range: Option<[i64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<i64>>,
}

impl TryFrom<RawKnob> for Knob {
    type Error = KnobError;

    fn try_from(raw: RawKnob) -> Result<Self, Self::Error> {
        let domain = match (raw.data_range, raw.values) {
            (Some([low, high]), None) => {
                if low > high {
                    return Err(KnobError::InvalidDomain(format!(
                        "range [{low}, {high}] is empty"
                    )));
                }
                KnobDomain::Range { low, high }
            }
            (None, Some(values)) => {
                let values: BTreeSet<i64> = values.into_iter().collect();
                if values.is_empty() {
                    return Err(KnobError::InvalidDomain("value set is empty".into()));
                }
                KnobDomain::Values(values)
            }
            (Some(_), Some(_)) => {
                return Err(KnobError::InvalidDomain(
                    "both `data_range` and `values` are set".into(),
                ))
            }
            (None, None) => {
                return Err(KnobError::InvalidDomain(
                    "one of `data_range` or `values` is required".into(),
                ))
            }
        };

        Ok(Self {
            data_type: raw.data_type,
            domain,
        })
    }
}

impl From<Knob> for RawKnob {
    fn from(knob: Knob) -> Self {
        let (data_range, values) = match knob.domain {
            KnobDomain::Range { low, high } => (Some([low, high]), None),
            KnobDomain::Values(values) => (None, Some(values.into_iter().collect())),
        };
        Self {
            data_type: knob.data_type,
            data_range,
            values,
        }
    }
}
