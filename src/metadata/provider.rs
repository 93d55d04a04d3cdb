//! Structural queries over parsed metadata
//!
//! Lookups return `None` for anything that does not resolve; callers decide
//! whether a missing piece is fatal.

use super::parser::parse_document;
use super::types::{
    qualify, split_qualified, ComplexType, EntityType, NavigationProperty, Property, PropertyRef,
};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use tracing::debug;

/// Read-only view of a service's type metadata
#[derive(Debug, Clone)]
pub struct MetadataProvider {
    raw: String,
    entity_types: Vec<EntityType>,
    complex_types: Vec<ComplexType>,
    /// entity set name -> qualified entity type name
    entity_sets: HashMap<String, String>,
}

impl MetadataProvider {
    /// Parse a metadata document
    pub fn parse(xml: impl Into<String>) -> Result<Self> {
        let raw = xml.into();
        let doc = parse_document(&raw)?;

        let mut entity_types = doc.entity_types;
        for entity in &mut entity_types {
            for nav in &mut entity.navigation_properties {
                let end = doc
                    .associations
                    .iter()
                    .find(|a| {
                        a.name == nav.relationship
                            || qualify(&a.namespace, &a.name) == nav.relationship
                    })
                    .and_then(|a| a.ends.iter().find(|end| end.role == nav.to_role));

                match end {
                    Some(end) => {
                        nav.target_type = Some(end.type_name.clone());
                        nav.multiplicity = Some(end.multiplicity);
                    }
                    None => debug!(
                        "Navigation {}.{} has no resolvable association '{}'",
                        entity.name, nav.name, nav.relationship
                    ),
                }
            }
        }

        Ok(Self {
            raw,
            entity_types,
            complex_types: doc.complex_types,
            entity_sets: doc.entity_sets.into_iter().collect(),
        })
    }

    /// Parse a metadata document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| Error::metadata_parse(format!("document is not UTF-8: {e}")))?;
        Self::parse(xml)
    }

    /// Base64 encoding of the raw document, for handing to another process
    pub fn encode(&self) -> String {
        STANDARD.encode(self.raw.as_bytes())
    }

    /// Rebuild a provider from [`encode`](Self::encode) output
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| Error::MetadataDecode {
            message: e.to_string(),
        })?;
        Self::from_bytes(&bytes).map_err(|e| Error::MetadataDecode {
            message: e.to_string(),
        })
    }

    /// The raw document text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All entity types in document order
    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    /// Entity type by entity set name, qualified type name or bare type name
    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        if let Some(qualified) = self.entity_sets.get(name) {
            if let Some(entity) = self.entity_type_by_qualified(qualified) {
                return Some(entity);
            }
        }

        let found = self
            .entity_type_by_qualified(name)
            .or_else(|| self.entity_types.iter().find(|t| t.name == name));
        if found.is_none() {
            debug!("Entity type '{}' not found in metadata", name);
        }
        found
    }

    fn entity_type_by_qualified(&self, qualified: &str) -> Option<&EntityType> {
        let (namespace, name) = split_qualified(qualified)?;
        self.entity_types
            .iter()
            .find(|t| t.namespace == namespace && t.name == name)
    }

    /// Names of every property of a type: structural first, then navigation
    pub fn property_names<'a>(&self, entity: &'a EntityType) -> Vec<&'a str> {
        entity
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .chain(entity.navigation_properties.iter().map(|n| n.name.as_str()))
            .collect()
    }

    /// Structural properties not explicitly hidden by `sap:visible="false"`
    pub fn visible_property_names<'a>(&self, entity: &'a EntityType) -> Vec<&'a str> {
        entity
            .properties
            .iter()
            .filter(|p| p.attributes.visible != Some(false))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Structural or navigation property by name
    pub fn property<'a>(&self, entity: &'a EntityType, name: &str) -> Option<PropertyRef<'a>> {
        entity
            .property(name)
            .map(PropertyRef::Structural)
            .or_else(|| entity.navigation(name).map(PropertyRef::Navigation))
    }

    /// Follow a slash-separated navigation path from an entity.
    ///
    /// Returns the navigation property reached by the last segment.
    pub fn navigation_property(
        &self,
        entity_name: &str,
        path: &str,
    ) -> Option<&NavigationProperty> {
        let mut entity = self.entity_type(entity_name)?;
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        let mut last = None;

        while let Some(segment) = segments.next() {
            let Some(nav) = entity.navigation(segment) else {
                debug!(
                    "Navigation path '{}' does not resolve at '{}' on {}",
                    path, segment, entity.name
                );
                return None;
            };
            last = Some(nav);
            if segments.peek().is_some() {
                entity = self.target_type(nav)?;
            }
        }

        last
    }

    /// Entity type reached by a navigation edge
    pub fn target_type(&self, nav: &NavigationProperty) -> Option<&EntityType> {
        let target = nav.target_type.as_deref()?;
        let found = self.entity_type_by_qualified(target);
        if found.is_none() {
            debug!("Target type '{}' of navigation '{}' not found", target, nav.name);
        }
        found
    }

    /// Complex type by namespace and name
    pub fn complex_type(&self, namespace: &str, name: &str) -> Option<&ComplexType> {
        let found = self
            .complex_types
            .iter()
            .find(|c| c.namespace == namespace && c.name == name);
        if found.is_none() {
            debug!("Complex type '{}.{}' not found", namespace, name);
        }
        found
    }

    /// Complex type declared by a property
    pub fn complex_type_of(&self, property: &Property) -> Option<&ComplexType> {
        let (namespace, name) = property.complex_type_name()?;
        self.complex_type(namespace, name)
    }
}
