//! Service type metadata
//!
//! Parses the service's metadata document and answers the structural
//! questions schema derivation asks: which entity types exist, what
//! properties they carry, where navigation edges lead and how complex
//! types are composed.
//!
//! Malformed documents fail at parse time. Lookups that do not resolve
//! return `None` and log at debug level.

mod parser;
mod provider;
mod types;

pub use provider::MetadataProvider;
pub use types::{
    qualify, split_qualified, Association, AssociationEnd, ComplexType, EntityType, Facets,
    Multiplicity, NavigationProperty, Property, PropertyRef, ServiceAttributes, EDM_NAMESPACE,
};

#[cfg(test)]
pub(crate) mod fixtures;
