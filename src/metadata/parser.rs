//! Metadata document (EDMX/CSDL) parser
//!
//! Single pass over the XML events. Only the constructs needed for schema
//! derivation are kept: entity types, complex types, associations and
//! entity sets.

use super::types::{
    Association, AssociationEnd, ComplexType, EntityType, Facets, Multiplicity,
    NavigationProperty, Property, ServiceAttributes,
};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Raw result of parsing, before navigation edges are resolved
#[derive(Debug, Default)]
pub(crate) struct ParsedDocument {
    pub entity_types: Vec<EntityType>,
    pub complex_types: Vec<ComplexType>,
    pub associations: Vec<Association>,
    /// (entity set name, qualified entity type name)
    pub entity_sets: Vec<(String, String)>,
}

/// Element currently being filled
enum Open {
    Entity(EntityType),
    Complex(ComplexType),
    Association(Association),
}

#[derive(Default)]
struct DocumentBuilder {
    doc: ParsedDocument,
    namespace: String,
    current: Option<Open>,
    schemas: usize,
}

/// Parse a metadata document
pub(crate) fn parse_document(xml: &str) -> Result<ParsedDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = DocumentBuilder::default();
    let mut depth = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(Error::metadata_parse(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )))
            }
        };

        match event {
            Event::Start(e) => {
                depth += 1;
                builder.start(&e, false)?;
            }
            Event::Empty(e) => builder.start(&e, true)?,
            Event::End(e) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::metadata_parse("unbalanced end tag"))?;
                builder.end(e.local_name().as_ref());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::metadata_parse("unexpected end of document"));
    }
    if builder.schemas == 0 {
        return Err(Error::metadata_parse("no Schema element found"));
    }

    Ok(builder.doc)
}

impl DocumentBuilder {
    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        let local = e.local_name();
        match local.as_ref() {
            b"Schema" => {
                let attrs = attributes(e)?;
                self.namespace = attrs.get("Namespace").cloned().unwrap_or_default();
                self.schemas += 1;
            }
            b"EntityType" => {
                let attrs = attributes(e)?;
                let entity = EntityType {
                    namespace: self.namespace.clone(),
                    name: required(&attrs, "Name", "EntityType")?,
                    ..EntityType::default()
                };
                self.open(Open::Entity(entity), empty);
            }
            b"ComplexType" => {
                let attrs = attributes(e)?;
                let complex = ComplexType {
                    namespace: self.namespace.clone(),
                    name: required(&attrs, "Name", "ComplexType")?,
                    ..ComplexType::default()
                };
                self.open(Open::Complex(complex), empty);
            }
            b"Association" => {
                let attrs = attributes(e)?;
                let association = Association {
                    namespace: self.namespace.clone(),
                    name: required(&attrs, "Name", "Association")?,
                    ..Association::default()
                };
                self.open(Open::Association(association), empty);
            }
            b"PropertyRef" => {
                if let Some(Open::Entity(entity)) = &mut self.current {
                    let attrs = attributes(e)?;
                    entity.keys.push(required(&attrs, "Name", "PropertyRef")?);
                }
            }
            b"Property" => {
                let property = parse_property(&attributes(e)?)?;
                match &mut self.current {
                    Some(Open::Entity(entity)) => entity.properties.push(property),
                    Some(Open::Complex(complex)) => complex.properties.push(property),
                    _ => {}
                }
            }
            b"NavigationProperty" => {
                if let Some(Open::Entity(entity)) = &mut self.current {
                    let attrs = attributes(e)?;
                    entity.navigation_properties.push(NavigationProperty {
                        name: required(&attrs, "Name", "NavigationProperty")?,
                        relationship: required(&attrs, "Relationship", "NavigationProperty")?,
                        from_role: attrs.get("FromRole").cloned().unwrap_or_default(),
                        to_role: required(&attrs, "ToRole", "NavigationProperty")?,
                        target_type: None,
                        multiplicity: None,
                        attributes: service_attributes(&attrs)?,
                    });
                }
            }
            b"End" => {
                if let Some(Open::Association(association)) = &mut self.current {
                    let attrs = attributes(e)?;
                    let raw = required(&attrs, "Multiplicity", "End")?;
                    let multiplicity = Multiplicity::parse(&raw).ok_or_else(|| {
                        Error::metadata_parse(format!("invalid multiplicity '{raw}'"))
                    })?;
                    association.ends.push(AssociationEnd {
                        role: attrs.get("Role").cloned().unwrap_or_default(),
                        type_name: required(&attrs, "Type", "End")?,
                        multiplicity,
                    });
                }
            }
            b"EntitySet" => {
                let attrs = attributes(e)?;
                self.doc.entity_sets.push((
                    required(&attrs, "Name", "EntitySet")?,
                    required(&attrs, "EntityType", "EntitySet")?,
                ));
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local: &[u8]) {
        if matches!(local, b"EntityType" | b"ComplexType" | b"Association") {
            self.close();
        }
    }

    fn open(&mut self, element: Open, empty: bool) {
        self.current = Some(element);
        if empty {
            self.close();
        }
    }

    fn close(&mut self) {
        match self.current.take() {
            Some(Open::Entity(entity)) => self.doc.entity_types.push(entity),
            Some(Open::Complex(complex)) => self.doc.complex_types.push(complex),
            Some(Open::Association(association)) => self.doc.associations.push(association),
            None => {}
        }
    }
}

/// Collect attributes keyed by local name
fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::metadata_parse(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::metadata_parse(err.to_string()))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required(attrs: &HashMap<String, String>, name: &str, element: &str) -> Result<String> {
    attrs
        .get(name)
        .cloned()
        .ok_or_else(|| Error::metadata_parse(format!("{element} is missing the {name} attribute")))
}

fn parse_property(attrs: &HashMap<String, String>) -> Result<Property> {
    let name = required(attrs, "Name", "Property")?;
    let type_name = required(attrs, "Type", "Property")?;

    let facets = Facets {
        nullable: optional_bool(attrs, "Nullable")?.unwrap_or(true),
        precision: optional_number(attrs, "Precision")?,
        scale: optional_number(attrs, "Scale")?,
        max_length: match attrs.get("MaxLength") {
            Some(v) if v.eq_ignore_ascii_case("max") => None,
            _ => optional_number(attrs, "MaxLength")?,
        },
        fixed_length: optional_bool(attrs, "FixedLength")?,
        unicode: optional_bool(attrs, "Unicode")?,
    };

    Ok(Property {
        name,
        type_name,
        facets,
        attributes: service_attributes(attrs)?,
    })
}

fn service_attributes(attrs: &HashMap<String, String>) -> Result<ServiceAttributes> {
    Ok(ServiceAttributes {
        visible: optional_bool(attrs, "visible")?,
        filter_restriction: attrs.get("filter-restriction").cloned(),
        required_in_filter: optional_bool(attrs, "required-in-filter")?,
        display_format: attrs.get("display-format").cloned(),
        label: attrs.get("label").cloned(),
    })
}

fn optional_bool(attrs: &HashMap<String, String>, name: &str) -> Result<Option<bool>> {
    attrs
        .get(name)
        .map(|v| match v.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::metadata_parse(format!(
                "attribute {name} has non-boolean value '{v}'"
            ))),
        })
        .transpose()
}

fn optional_number(attrs: &HashMap<String, String>, name: &str) -> Result<Option<u32>> {
    attrs
        .get(name)
        .map(|v| {
            v.trim().parse::<u32>().map_err(|_| {
                Error::metadata_parse(format!("attribute {name} has non-numeric value '{v}'"))
            })
        })
        .transpose()
}
