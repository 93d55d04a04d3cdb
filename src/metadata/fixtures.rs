//! Shared metadata document for unit tests

use super::MetadataProvider;

/// Catalog service document: products, categories, reviews, customers
pub(crate) const CATALOG_METADATA: &str =
    include_str!("../../tests/fixtures/catalog_metadata.xml");

pub(crate) fn catalog() -> MetadataProvider {
    MetadataProvider::parse(CATALOG_METADATA).unwrap()
}
