//! The set of knobs exposed by one program.

use crate::config::Config;
use crate::error::KnobError;
use crate::knob::Knob;
use crate::tree::flatten;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Nesting depth of the discovery document: function, operator, parameter.
pub const KNOB_DEPTH: usize = 3;

/// A knob path split into its three segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnobPath<'a> {
    pub function: &'a str,
    pub operator: &'a str,
    pub parameter: &'a str,
}

impl<'a> KnobPath<'a> {
    pub fn parse(path: &'a str) -> Result<Self, KnobError> {
        let mut segments = path.split('.');
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(function), Some(operator), Some(parameter), None)
                if !function.is_empty() && !operator.is_empty() && !parameter.is_empty() =>
            {
                Ok(Self {
                    function,
                    operator,
                    parameter,
                })
            }
            _ => Err(KnobError::MalformedPath(path.to_string())),
        }
    }

    pub fn mask(&self) -> Mask {
        Mask {
            function: self.function.to_string(),
            operator: self.operator.to_string(),
        }
    }
}

/// Identifies one operator: the `function.operator` prefix shared by its knobs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mask {
    pub function: String,
    pub operator: String,
}

impl Mask {
    /// Substring used to select this operator's knobs. The trailing separator
    /// keeps `main.mul` from selecting `main.mul2`, but matching is by
    /// substring, so a function whose name ends in `main` (`xmain.mul.*`)
    /// is still selected.
    pub fn filter_pattern(&self) -> String {
        format!("{}.{}.", self.function, self.operator)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.function, self.operator)
    }
}

/// Flat mapping from `function.operator.parameter` to [`Knob`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnobSpace {
    knobs: BTreeMap<String, Knob>,
}

impl KnobSpace {
    /// Build a space from knobs keyed by path; every path must have three segments.
    pub fn from_knobs(knobs: BTreeMap<String, Knob>) -> Result<Self, KnobError> {
        for path in knobs.keys() {
            KnobPath::parse(path)?;
        }
        Ok(Self { knobs })
    }

    /// Parse the nested discovery document.
    pub fn from_nested(document: &Value) -> Result<Self, KnobError> {
        Self::from_flat(flatten(document, KNOB_DEPTH)?)
    }

    /// Parse an already flattened document (path -> knob description).
    pub fn from_flat(flat: BTreeMap<String, Value>) -> Result<Self, KnobError> {
        let knobs = flat
            .into_iter()
            .map(|(path, raw)| match serde_json::from_value::<Knob>(raw) {
                Ok(knob) => Ok((path, knob)),
                Err(source) => Err(KnobError::Parse { path, source }),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Self::from_knobs(knobs)
    }

    /// Flattened document, as cached next to the discovery artifacts.
    pub fn to_flat_json(&self) -> Result<Value, KnobError> {
        self.knobs
            .iter()
            .map(|(path, knob)| match serde_json::to_value(knob) {
                Ok(raw) => Ok((path.clone(), raw)),
                Err(source) => Err(KnobError::Encode {
                    path: path.clone(),
                    source,
                }),
            })
            .collect::<Result<_, _>>()
            .map(Value::Object)
    }

    pub fn len(&self) -> usize {
        self.knobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knobs.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Knob> {
        self.knobs.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.knobs.contains_key(path)
    }

    /// Knobs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Knob)> {
        self.knobs.iter().map(|(path, knob)| (path.as_str(), knob))
    }

    /// Distinct operators present in the space.
    pub fn masks(&self) -> BTreeSet<Mask> {
        self.knobs
            .keys()
            .filter_map(|path| KnobPath::parse(path).ok())
            .map(|path| path.mask())
            .collect()
    }

    /// Knobs whose path contains `pattern` anywhere, not only as a prefix.
    pub fn filter(&self, pattern: &str) -> KnobSpace {
        Self {
            knobs: self
                .knobs
                .iter()
                .filter(|(path, _)| path.contains(pattern))
                .map(|(path, knob)| (path.clone(), knob.clone()))
                .collect(),
        }
    }

    /// Every knob at its lowest value.
    pub fn defaults(&self) -> Config {
        self.knobs
            .iter()
            .map(|(path, knob)| (path.clone(), knob.default_value()))
            .collect()
    }
}
