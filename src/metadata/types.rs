//! Type descriptors for a parsed metadata document

use serde::{Deserialize, Serialize};

/// Primitive type prefix in metadata documents
pub const EDM_NAMESPACE: &str = "Edm";

/// Cardinality of a navigation edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    /// Exactly one (`1`)
    One,
    /// Zero or one (`0..1`)
    ZeroOrOne,
    /// Any number (`*`)
    Many,
}

impl Multiplicity {
    /// Parse the association end notation
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::One),
            "0..1" => Some(Self::ZeroOrOne),
            "*" => Some(Self::Many),
            _ => None,
        }
    }

    /// Whether the edge leads to a collection
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }
}

/// Property facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    /// Declared nullability (defaults to true)
    pub nullable: bool,
    /// Decimal precision
    pub precision: Option<u32>,
    /// Decimal scale
    pub scale: Option<u32>,
    /// Maximum length, `None` for unbounded
    pub max_length: Option<u32>,
    /// Fixed-length string
    pub fixed_length: Option<bool>,
    /// Unicode string
    pub unicode: Option<bool>,
}

impl Default for Facets {
    fn default() -> Self {
        Self {
            nullable: true,
            precision: None,
            scale: None,
            max_length: None,
            fixed_length: None,
            unicode: None,
        }
    }
}

/// Service-specific (`sap:`) annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAttributes {
    /// `sap:visible`
    pub visible: Option<bool>,
    /// `sap:filter-restriction`
    pub filter_restriction: Option<String>,
    /// `sap:required-in-filter`
    pub required_in_filter: Option<bool>,
    /// `sap:display-format`
    pub display_format: Option<String>,
    /// `sap:label`
    pub label: Option<String>,
}

/// A structural property of an entity or complex type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Declared type, e.g. `Edm.String` or `NS.Address`
    pub type_name: String,
    /// Facets
    pub facets: Facets,
    /// Annotations
    pub attributes: ServiceAttributes,
}

impl Property {
    /// Primitive type name without the `Edm.` prefix, if primitive
    pub fn primitive_type(&self) -> Option<&str> {
        self.type_name
            .strip_prefix(EDM_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
    }

    /// Whether the property is typed by a complex type
    pub fn is_complex(&self) -> bool {
        self.primitive_type().is_none()
    }

    /// Namespace and name of a complex property's type
    pub fn complex_type_name(&self) -> Option<(&str, &str)> {
        if !self.is_complex() {
            return None;
        }
        split_qualified(&self.type_name)
    }
}

/// A navigation property resolved against its association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationProperty {
    /// Property name
    pub name: String,
    /// Association name as declared
    pub relationship: String,
    /// Source role
    pub from_role: String,
    /// Target role
    pub to_role: String,
    /// Qualified name of the target entity type
    pub target_type: Option<String>,
    /// Cardinality of the target end
    pub multiplicity: Option<Multiplicity>,
    /// Annotations
    pub attributes: ServiceAttributes,
}

/// An entity type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityType {
    /// Schema namespace
    pub namespace: String,
    /// Type name
    pub name: String,
    /// Key property names
    pub keys: Vec<String>,
    /// Structural properties in document order
    pub properties: Vec<Property>,
    /// Navigation properties in document order
    pub navigation_properties: Vec<NavigationProperty>,
}

impl EntityType {
    /// Structural property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Navigation property by name
    pub fn navigation(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigation_properties.iter().find(|p| p.name == name)
    }
}

/// A complex (structured, non-entity) type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplexType {
    /// Schema namespace
    pub namespace: String,
    /// Type name
    pub name: String,
    /// Properties in document order
    pub properties: Vec<Property>,
}

/// One end of an association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationEnd {
    /// Role name
    pub role: String,
    /// Qualified entity type name
    pub type_name: String,
    /// Cardinality
    pub multiplicity: Multiplicity,
}

/// An association between two entity types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Association {
    /// Schema namespace
    pub namespace: String,
    /// Association name
    pub name: String,
    /// Both ends
    pub ends: Vec<AssociationEnd>,
}

/// Either kind of property on an entity type
#[derive(Debug, Clone, Copy)]
pub enum PropertyRef<'a> {
    /// Structural (primitive or complex) property
    Structural(&'a Property),
    /// Navigation property
    Navigation(&'a NavigationProperty),
}

impl PropertyRef<'_> {
    /// Property name
    pub fn name(&self) -> &str {
        match self {
            PropertyRef::Structural(p) => &p.name,
            PropertyRef::Navigation(n) => &n.name,
        }
    }
}

/// Join a namespace and a name
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Split `NS.Sub.Name` into (`NS.Sub`, `Name`)
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('.')
}
