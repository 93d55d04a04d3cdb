//! Feed decoding
//!
//! Parses JSON data pages into raw entries plus the continuation link, and
//! strips duplicated inline sub-trees from expanded navigations.

mod feed;
mod types;

pub use feed::{filter_expanded, ExpandTree};
pub use types::{
    FeedPage, DEFERRED_ELEMENT, METADATA_ELEMENT, NEXT_LINK_ELEMENT, RESULTS_ELEMENT, ROOT_ELEMENT,
};
