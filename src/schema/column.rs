//! Column metadata tree
//!
//! Built bottom-up while walking the metadata, then frozen and rendered
//! into an [`OutputSchema`](super::OutputSchema).

use crate::metadata::{
    EntityType, Facets, Multiplicity, NavigationProperty, Property, ServiceAttributes,
};

/// What a column was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Primitive property
    Primitive,
    /// Complex-typed property
    Complex,
    /// Navigation property
    Navigation,
    /// Synthetic root holding top-level columns
    Root,
}

/// One node of the column tree
#[derive(Debug, Clone)]
pub struct ColumnMetadata {
    name: String,
    type_name: String,
    kind: ColumnKind,
    multiplicity: Option<Multiplicity>,
    facets: Facets,
    attributes: ServiceAttributes,
    children: Vec<ColumnMetadata>,
    frozen: bool,
}

impl ColumnMetadata {
    fn new(name: &str, type_name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            kind,
            multiplicity: None,
            facets: Facets::default(),
            attributes: ServiceAttributes::default(),
            children: Vec::new(),
            frozen: false,
        }
    }

    /// Synthetic root node
    pub fn root(name: &str) -> Self {
        Self::new(name, name, ColumnKind::Root)
    }

    /// Column for a structural property
    pub fn from_property(property: &Property) -> Self {
        let (type_name, kind) = match property.primitive_type() {
            Some(primitive) => (primitive, ColumnKind::Primitive),
            None => (property.type_name.as_str(), ColumnKind::Complex),
        };
        Self {
            facets: property.facets.clone(),
            attributes: property.attributes.clone(),
            ..Self::new(&property.name, type_name, kind)
        }
    }

    /// Column for a navigation property, without children
    pub fn from_navigation(nav: &NavigationProperty, target: &EntityType) -> Self {
        Self {
            multiplicity: nav.multiplicity,
            attributes: nav.attributes.clone(),
            ..Self::new(&nav.name, &target.name, ColumnKind::Navigation)
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote type name (primitive name without prefix, or target type)
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Column kind
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Navigation cardinality
    pub fn multiplicity(&self) -> Option<Multiplicity> {
        self.multiplicity
    }

    /// Property facets
    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Service annotations
    pub fn attributes(&self) -> &ServiceAttributes {
        &self.attributes
    }

    /// Child columns in order
    pub fn children(&self) -> &[ColumnMetadata] {
        &self.children
    }

    /// Whether the node has been frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Append a child column.
    ///
    /// # Panics
    ///
    /// Panics if the node is frozen.
    pub fn append_child(&mut self, child: ColumnMetadata) -> usize {
        assert!(
            !self.frozen,
            "cannot append '{}' to frozen column '{}'",
            child.name, self.name
        );
        self.children.push(child);
        self.children.len() - 1
    }

    /// Position of the child with the given name
    pub fn child_position(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == name)
    }

    /// Mutable access to a child.
    ///
    /// # Panics
    ///
    /// Panics if the node is frozen or `index` is out of bounds.
    pub fn child_mut(&mut self, index: usize) -> &mut ColumnMetadata {
        assert!(!self.frozen, "cannot modify frozen column '{}'", self.name);
        &mut self.children[index]
    }

    /// Freeze this node and every descendant
    pub fn freeze(&mut self) {
        self.frozen = true;
        for child in &mut self.children {
            child.freeze();
        }
    }
}
