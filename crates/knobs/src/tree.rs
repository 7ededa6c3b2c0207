//! Conversion between nested documents and flat dotted-key maps.
//!
//! Both directions walk the tree with an explicit stack, so a document that
//! is deeper (or shallower) than expected is reported instead of overflowing
//! or being silently truncated.

use crate::error::KnobError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

const SEPARATOR: char = '.';

/// Flatten a document nested exactly `depth` levels deep.
///
/// Every mapping above `depth` contributes one key segment; the values found
/// at `depth` become the leaves of the result, keyed by the dot-joined path.
/// Empty mappings above `depth` contribute nothing.
pub fn flatten(nested: &Value, depth: usize) -> Result<BTreeMap<String, Value>, KnobError> {
    let mut flat = BTreeMap::new();
    let mut stack: Vec<(String, &Value, usize)> = vec![(String::new(), nested, 0)];

    while let Some((path, node, level)) = stack.pop() {
        if level == depth {
            flat.insert(path, node.clone());
            continue;
        }

        let Value::Object(map) = node else {
            return Err(KnobError::NotAMapping {
                path: display_path(&path),
                level,
                depth,
            });
        };

        for (segment, child) in map {
            if segment.is_empty() || segment.contains(SEPARATOR) {
                return Err(KnobError::InvalidSegment {
                    path: display_path(&path),
                    segment: segment.clone(),
                });
            }
            let child_path = if path.is_empty() {
                segment.clone()
            } else {
                format!("{path}{SEPARATOR}{segment}")
            };
            stack.push((child_path, child, level + 1));
        }
    }

    Ok(flat)
}

/// Rebuild a nested document from dotted keys.
///
/// Each key is split at every `.`; keys without a separator are leaves of the
/// root mapping. A key that is a strict prefix of another key cannot be
/// represented and is rejected.
pub fn unflatten<V>(flat: &BTreeMap<String, V>) -> Result<Value, KnobError>
where
    V: Clone + Into<Value>,
{
    let mut root = Map::new();
    let mut leaves: BTreeSet<&str> = BTreeSet::new();

    for (key, value) in flat {
        if key.split(SEPARATOR).any(str::is_empty) {
            return Err(KnobError::MalformedPath(key.clone()));
        }

        let mut node = &mut root;
        let mut rest = key.as_str();
        while let Some((head, tail)) = rest.split_once(SEPARATOR) {
            let prefix = &key[..key.len() - tail.len() - 1];
            if leaves.contains(prefix) {
                return Err(KnobError::PathCollision {
                    path: key.clone(),
                    other: prefix.to_string(),
                });
            }
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                _ => {
                    return Err(KnobError::PathCollision {
                        path: key.clone(),
                        other: prefix.to_string(),
                    })
                }
            };
            rest = tail;
        }

        if node.contains_key(rest) {
            return Err(KnobError::PathCollision {
                path: key.clone(),
                other: format!("{key}{SEPARATOR}*"),
            });
        }
        node.insert(rest.to_string(), value.clone().into());
        leaves.insert(key.as_str());
    }

    Ok(Value::Object(root))
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
