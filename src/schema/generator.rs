//! Schema derivation from service metadata
//!
//! Every mode first builds a [`ColumnMetadata`] tree, freezes it and then
//! renders it into an [`OutputSchema`].

use super::column::{ColumnKind, ColumnMetadata};
use super::types::{logical_type, FieldType, OutputSchema, SchemaField, SchemaMode};
use crate::error::{ConfigField, Error, Result};
use crate::metadata::{EntityType, MetadataProvider, NavigationProperty, Property, PropertyRef};
use tracing::{debug, info};
use uuid::Uuid;

/// Derives output schemas for an entity
#[derive(Debug, Clone, Copy)]
pub struct SchemaGenerator<'a> {
    metadata: &'a MetadataProvider,
}

impl<'a> SchemaGenerator<'a> {
    /// Create a generator over parsed metadata
    pub fn new(metadata: &'a MetadataProvider) -> Self {
        Self { metadata }
    }

    // ========================================================================
    // Mode dispatch
    // ========================================================================

    /// Derive the schema for one run.
    ///
    /// Select wins over expand; when both are given the expand paths are
    /// appended to the select list.
    pub fn build(
        &self,
        entity: &str,
        select: Option<&str>,
        expand: Option<&str>,
        associated: Option<&str>,
    ) -> Result<OutputSchema> {
        let mode = SchemaMode::for_options(select, expand);
        info!("Deriving {} schema for entity '{}'", mode.as_str(), entity);

        match (select, expand) {
            (Some(select), Some(expand)) => {
                self.selected_schema(entity, &format!("{select},{expand}"))
            }
            (Some(select), None) => self.selected_schema(entity, select),
            (None, Some(expand)) => self.expanded_schema(entity, expand, associated),
            (None, None) => self.default_schema(entity),
        }
    }

    /// Schema with the structural properties of the entity
    pub fn default_schema(&self, entity: &str) -> Result<OutputSchema> {
        let entity_type = self.entity_type(entity)?;
        let columns = self.default_columns(entity)?;
        render(&entity_type.name, columns)
    }

    /// Default schema plus the expanded navigation paths
    pub fn expanded_schema(
        &self,
        entity: &str,
        expand: &str,
        associated: Option<&str>,
    ) -> Result<OutputSchema> {
        let entity_type = self.entity_type(entity)?;
        let columns = self.expanded_columns(entity, expand, associated)?;
        render(&entity_type.name, columns)
    }

    /// Schema with only the selected properties and paths
    pub fn selected_schema(&self, entity: &str, select: &str) -> Result<OutputSchema> {
        let entity_type = self.entity_type(entity)?;
        let columns = self.selected_columns(entity, select)?;
        render(&entity_type.name, columns)
    }

    // ========================================================================
    // Column trees
    // ========================================================================

    /// Column tree for the structural properties of the entity.
    ///
    /// Navigations are left out; they only enter through expand or select
    /// paths.
    pub fn default_columns(&self, entity: &str) -> Result<ColumnMetadata> {
        let entity_type = self.entity_type(entity)?;
        let mut root = ColumnMetadata::root(&entity_type.name);
        for column in self.entity_columns(entity_type) {
            root.append_child(column);
        }

        if root.children().is_empty() {
            return Err(
                Error::no_columns("default", entity).with_config_field(ConfigField::EntityName),
            );
        }
        Ok(root)
    }

    /// Default column tree merged with the comma-separated expand paths
    pub fn expanded_columns(
        &self,
        entity: &str,
        expand: &str,
        associated: Option<&str>,
    ) -> Result<ColumnMetadata> {
        let entity_type = self.entity_type(entity)?;
        let mut root = ColumnMetadata::root(&entity_type.name);
        for column in self.entity_columns(entity_type) {
            root.append_child(column);
        }

        for path in split_list(expand) {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let Some(first) = segments.first() else {
                continue;
            };

            if entity_type.navigation(first).is_none() {
                let err = match associated {
                    Some(associated) => {
                        Error::unsupported_associated_entity(associated, &entity_type.name)
                    }
                    None => Error::no_columns("expand", entity),
                };
                return Err(err.with_config_field(ConfigField::Expand));
            }

            self.merge_path(&mut root, entity_type, path, &segments, PathMode::Expand)?;
        }

        if root.children().is_empty() {
            return Err(
                Error::no_columns("expand", entity).with_config_field(ConfigField::Expand),
            );
        }
        Ok(root)
    }

    /// Column tree for a comma-separated select list.
    ///
    /// Plain names resolve against the entity; names missing from the
    /// metadata are skipped. Slash paths share prefixes and may end in a
    /// property or a navigation.
    pub fn selected_columns(&self, entity: &str, select: &str) -> Result<ColumnMetadata> {
        let entity_type = self.entity_type(entity)?;
        let mut root = ColumnMetadata::root(&entity_type.name);

        let (paths, plain): (Vec<&str>, Vec<&str>) =
            split_list(select).partition(|entry| entry.contains('/'));

        for name in plain {
            if root.child_position(name).is_some() {
                continue;
            }
            match self.metadata.property(entity_type, name) {
                Some(PropertyRef::Structural(property)) => {
                    if let Some(column) = self.structural_column(property) {
                        root.append_child(column);
                    }
                }
                Some(PropertyRef::Navigation(nav)) => {
                    if let Some(column) = self.navigation_node(nav) {
                        root.append_child(column);
                    }
                }
                None => debug!("Selected property '{}' not found on {}", name, entity_type.name),
            }
        }

        for path in paths {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                continue;
            }
            self.merge_path(&mut root, entity_type, path, &segments, PathMode::Select)?;
        }

        if root.children().is_empty() {
            return Err(
                Error::no_columns("select", entity).with_config_field(ConfigField::Select),
            );
        }
        Ok(root)
    }

    // ========================================================================
    // Tree building
    // ========================================================================

    fn entity_type(&self, entity: &str) -> Result<&'a EntityType> {
        self.metadata.entity_type(entity).ok_or_else(|| {
            Error::schema(format!("entity '{entity}' not found in metadata"))
                .with_config_field(ConfigField::EntityName)
        })
    }

    /// Primitive and complex columns of a type
    fn entity_columns(&self, entity: &EntityType) -> Vec<ColumnMetadata> {
        entity
            .properties
            .iter()
            .filter_map(|p| self.structural_column(p))
            .collect()
    }

    /// Leaf column, or a complex column with its sub-properties
    fn structural_column(&self, property: &Property) -> Option<ColumnMetadata> {
        let mut column = ColumnMetadata::from_property(property);
        if column.kind() != ColumnKind::Complex {
            return Some(column);
        }

        let complex = self.metadata.complex_type_of(property)?;
        for sub in &complex.properties {
            if let Some(child) = self.structural_column(sub) {
                column.append_child(child);
            }
        }
        Some(column)
    }

    /// Navigation column holding the structural columns of its target type
    fn navigation_node(&self, nav: &NavigationProperty) -> Option<ColumnMetadata> {
        let Some(target) = self.metadata.target_type(nav) else {
            debug!("Navigation '{}' has no resolvable target type", nav.name);
            return None;
        };
        let mut column = ColumnMetadata::from_navigation(nav, target);
        for child in self.entity_columns(target) {
            column.append_child(child);
        }
        Some(column)
    }

    /// Walk one slash path into the tree, reusing nodes for known prefixes
    fn merge_path(
        &self,
        root: &mut ColumnMetadata,
        root_entity: &'a EntityType,
        path: &str,
        segments: &[&str],
        mode: PathMode,
    ) -> Result<()> {
        let config_field = mode.config_field();
        let mut node = root;
        let mut entity = root_entity;

        for (i, segment) in segments.iter().enumerate() {
            let terminal = i + 1 == segments.len();
            let unresolved = || {
                Error::schema(format!(
                    "{} path '{path}' does not resolve at '{segment}'",
                    mode.option()
                ))
                .with_config_field(config_field)
            };

            match self.metadata.property(entity, segment) {
                Some(PropertyRef::Navigation(nav)) => {
                    let target = self.metadata.target_type(nav).ok_or_else(unresolved)?;
                    let index = match node.child_position(segment) {
                        Some(index) => index,
                        None => {
                            let child = if terminal || mode == PathMode::Expand {
                                self.navigation_node(nav).ok_or_else(unresolved)?
                            } else {
                                ColumnMetadata::from_navigation(nav, target)
                            };
                            node.append_child(child)
                        }
                    };
                    node = node.child_mut(index);
                    entity = target;
                }
                Some(PropertyRef::Structural(property)) if terminal && mode == PathMode::Select => {
                    if node.child_position(segment).is_none() {
                        let column = self.structural_column(property).ok_or_else(unresolved)?;
                        node.append_child(column);
                    }
                }
                _ => return Err(unresolved()),
            }
        }

        Ok(())
    }
}

/// Which option a slash path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMode {
    Expand,
    Select,
}

impl PathMode {
    fn option(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Select => "select",
        }
    }

    fn config_field(self) -> ConfigField {
        match self {
            Self::Expand => ConfigField::Expand,
            Self::Select => ConfigField::Select,
        }
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Rendering
// ============================================================================

/// Freeze a column tree and render it as an output schema
pub(crate) fn render(name: &str, mut root: ColumnMetadata) -> Result<OutputSchema> {
    root.freeze();
    let fields = render_children(&root);
    if fields.is_empty() {
        return Err(Error::no_columns("schema", name));
    }
    Ok(OutputSchema::new(name, fields))
}

fn render_children(column: &ColumnMetadata) -> Vec<SchemaField> {
    column.children().iter().filter_map(render_field).collect()
}

fn render_field(column: &ColumnMetadata) -> Option<SchemaField> {
    match column.kind() {
        ColumnKind::Primitive => {
            let logical = logical_type(column.type_name());
            let nullable = logical.is_temporal() || column.facets().nullable;
            Some(SchemaField::new(
                column.name(),
                FieldType::from_logical(logical, column.facets()),
                nullable,
            ))
        }
        ColumnKind::Complex | ColumnKind::Navigation => {
            let fields = render_children(column);
            if fields.is_empty() {
                debug!("Dropping '{}': no fields resolved", column.name());
                return None;
            }
            let record = FieldType::Record {
                name: record_name(column.name()),
                fields,
            };
            if column.multiplicity().is_some_and(|m| m.is_many()) {
                Some(SchemaField::new(
                    column.name(),
                    FieldType::Array {
                        items: Box::new(record),
                    },
                    false,
                ))
            } else {
                Some(SchemaField::new(column.name(), record, true))
            }
        }
        ColumnKind::Root => None,
    }
}

/// Nested record names carry a random suffix so repeated field names never
/// collide within one schema
fn record_name(field: &str) -> String {
    format!("{}_{}", field, Uuid::new_v4().simple())
}
