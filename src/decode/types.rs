//! Feed page types

use crate::types::JsonObject;

/// Key wrapping every JSON payload
pub const ROOT_ELEMENT: &str = "d";

/// Key holding a collection of entries
pub const RESULTS_ELEMENT: &str = "results";

/// Key holding the continuation link
pub const NEXT_LINK_ELEMENT: &str = "__next";

/// Key holding per-entry service metadata
pub const METADATA_ELEMENT: &str = "__metadata";

/// Key marking a navigation that was not expanded
pub const DEFERRED_ELEMENT: &str = "__deferred";

/// One page of raw entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    /// Raw entries in server order
    pub entries: Vec<JsonObject>,
    /// Continuation URL for the next page, if any
    pub next_link: Option<String>,
}

impl FeedPage {
    /// Create a page
    pub fn new(entries: Vec<JsonObject>, next_link: Option<String>) -> Self {
        Self {
            entries,
            next_link,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the page carries no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
