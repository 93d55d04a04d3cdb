//! JSON feed parsing and the expand post-filter

use super::types::{FeedPage, NEXT_LINK_ELEMENT, RESULTS_ELEMENT, ROOT_ELEMENT};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::BTreeMap;
use tracing::debug;

impl FeedPage {
    /// Parse a JSON feed body.
    ///
    /// Accepts `{"d": {"results": [...], "__next": "..."}}`, a bare
    /// `{"d": [...]}` array, or a single entry `{"d": {...}}`.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let root: JsonValue = serde_json::from_slice(body)
            .map_err(|e| Error::decode(format!("Failed to parse feed JSON: {e}")))?;

        let Some(payload) = root.get(ROOT_ELEMENT) else {
            return Err(Error::decode(format!(
                "feed has no '{ROOT_ELEMENT}' element"
            )));
        };

        match payload {
            JsonValue::Array(items) => Ok(Self::new(entries_from(items)?, None)),
            JsonValue::Object(object) => match object.get(RESULTS_ELEMENT) {
                Some(JsonValue::Array(items)) => {
                    let next_link = object
                        .get(NEXT_LINK_ELEMENT)
                        .and_then(JsonValue::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                    Ok(Self::new(entries_from(items)?, next_link))
                }
                Some(_) => Err(Error::decode(format!(
                    "'{RESULTS_ELEMENT}' is not an array"
                ))),
                None => Ok(Self::new(vec![object.clone()], None)),
            },
            other => Err(Error::decode(format!(
                "unexpected '{ROOT_ELEMENT}' payload: {other}"
            ))),
        }
    }
}

fn entries_from(items: &[JsonValue]) -> Result<Vec<JsonObject>> {
    items
        .iter()
        .map(|item| match item {
            JsonValue::Object(entry) => Ok(entry.clone()),
            other => Err(Error::decode(format!("feed entry is not an object: {other}"))),
        })
        .collect()
}

// ============================================================================
// Expand filter
// ============================================================================

/// Requested expand paths as a tree of segment names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandTree {
    children: BTreeMap<String, ExpandTree>,
}

impl ExpandTree {
    /// Build from a comma-separated list of slash paths
    pub fn parse(expand: &str) -> Self {
        let mut tree = Self::default();
        for path in expand.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut node = &mut tree;
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                node = node.children.entry(segment.to_string()).or_default();
            }
        }
        tree
    }

    /// Subtree for a segment
    pub fn child(&self, segment: &str) -> Option<&ExpandTree> {
        self.children.get(segment)
    }

    /// Top-level segment names
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Whether no path was requested
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Strip inline containers the service embeds inside expanded navigations.
///
/// Inside every expanded node, nested objects and arrays are removed unless
/// they are themselves a requested expand segment or a `results`
/// collection, which is descended into.
pub fn filter_expanded(entries: &mut [JsonObject], expand: &ExpandTree) {
    for entry in entries.iter_mut() {
        for segment in expand.segments() {
            let Some(node) = entry.get_mut(segment) else {
                continue;
            };
            let requested = expand.child(segment).cloned().unwrap_or_default();
            prune_expanded(node, &requested);
        }
    }
}

fn prune_expanded(node: &mut JsonValue, requested: &ExpandTree) {
    let Some(object) = node.as_object_mut() else {
        return;
    };

    if let Some(JsonValue::Array(items)) = object.get_mut(RESULTS_ELEMENT) {
        for item in items {
            prune_object(item, requested);
        }
    } else {
        prune_object(node, requested);
    }
}

fn prune_object(node: &mut JsonValue, requested: &ExpandTree) {
    let Some(object) = node.as_object_mut() else {
        return;
    };

    object.retain(|key, value| {
        if !is_container(value) {
            return true;
        }
        if let Some(subtree) = requested.child(key) {
            prune_expanded(value, subtree);
            return true;
        }
        if let Some(JsonValue::Array(items)) = value.get_mut(RESULTS_ELEMENT) {
            for item in items {
                prune_object(item, &ExpandTree::default());
            }
            return true;
        }
        debug!("Removing inline container '{}' from expanded entry", key);
        false
    });
}

fn is_container(value: &JsonValue) -> bool {
    value.is_object() || value.is_array()
}
