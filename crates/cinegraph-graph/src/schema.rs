//! Structured graph schema and its prompt rendering

use crate::client::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A property key with its declared type (`STRING`, `INTEGER`, `LIST`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub kind: String,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// `(:start)-[:rel_type]->(:end)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTriple {
    pub start: String,
    pub rel_type: String,
    pub end: String,
}

impl RelationshipTriple {
    pub fn new(start: impl Into<String>, rel_type: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            rel_type: rel_type.into(),
            end: end.into(),
        }
    }
}

/// Node labels, relationship types, their properties, and which
/// relationships connect which labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    pub node_properties: BTreeMap<String, Vec<Property>>,
    pub relationship_properties: BTreeMap<String, Vec<Property>>,
    pub relationships: Vec<RelationshipTriple>,
}

impl GraphSchema {
    pub fn with_node(mut self, label: &str, properties: &[(&str, &str)]) -> Self {
        self.node_properties.insert(
            label.to_string(),
            properties.iter().map(|(n, k)| Property::new(*n, *k)).collect(),
        );
        self
    }

    pub fn with_relationship_properties(mut self, rel_type: &str, properties: &[(&str, &str)]) -> Self {
        self.relationship_properties.insert(
            rel_type.to_string(),
            properties.iter().map(|(n, k)| Property::new(*n, *k)).collect(),
        );
        self
    }

    pub fn with_relationship(mut self, start: &str, rel_type: &str, end: &str) -> Self {
        self.relationships.push(RelationshipTriple::new(start, rel_type, end));
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.node_properties.contains_key(label)
            || self.relationships.iter().any(|t| t.start == label || t.end == label)
    }

    pub fn has_relationship_type(&self, rel_type: &str) -> bool {
        self.relationships.iter().any(|t| t.rel_type == rel_type)
            || self.relationship_properties.contains_key(rel_type)
    }

    /// True when any node label or relationship type declares the key.
    pub fn has_property(&self, name: &str) -> bool {
        self.node_properties
            .values()
            .chain(self.relationship_properties.values())
            .flatten()
            .any(|p| p.name == name)
    }

    pub fn has_triple(&self, start: &str, rel_type: &str, end: &str) -> bool {
        self.relationships
            .iter()
            .any(|t| t.start == start && t.rel_type == rel_type && t.end == end)
    }

    /// Assemble a schema from the three `apoc.meta.data()` projections.
    ///
    /// Each record carries a single `output` map:
    /// nodes `{labels, properties: [{property, type}]}`,
    /// relationship properties `{type, properties}`,
    /// triples `{start, type, end}`.
    pub fn from_meta(nodes: &[Record], rel_properties: &[Record], triples: &[Record]) -> Self {
        let mut schema = GraphSchema::default();

        for output in nodes.iter().filter_map(|r| r.get("output")) {
            if let Some(label) = output.get("labels").and_then(Value::as_str) {
                schema
                    .node_properties
                    .insert(label.to_string(), parse_properties(output.get("properties")));
            }
        }

        for output in rel_properties.iter().filter_map(|r| r.get("output")) {
            if let Some(rel_type) = output.get("type").and_then(Value::as_str) {
                schema
                    .relationship_properties
                    .insert(rel_type.to_string(), parse_properties(output.get("properties")));
            }
        }

        for output in triples.iter().filter_map(|r| r.get("output")) {
            let field = |k: &str| output.get(k).and_then(Value::as_str);
            if let (Some(start), Some(rel_type), Some(end)) = (field("start"), field("type"), field("end")) {
                let triple = RelationshipTriple::new(start, rel_type, end);
                if !schema.relationships.contains(&triple) {
                    schema.relationships.push(triple);
                }
            }
        }

        schema
    }
}

fn parse_properties(value: Option<&Value>) -> Vec<Property> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|p| {
                    let name = p.get("property")?.as_str()?;
                    let kind = p.get("type").and_then(Value::as_str).unwrap_or("ANY");
                    Some(Property::new(name, kind))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn write_properties(f: &mut fmt::Formatter<'_>, name: &str, props: &[Property]) -> fmt::Result {
    let body = props
        .iter()
        .map(|p| format!("{}: {}", p.name, p.kind))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(f, "{} {{{}}}", name, body)
}

/// The text block interpolated verbatim into synthesis prompts.
impl fmt::Display for GraphSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Node properties are the following:")?;
        for (label, props) in &self.node_properties {
            write_properties(f, label, props)?;
        }
        writeln!(f, "Relationship properties are the following:")?;
        for (rel_type, props) in &self.relationship_properties {
            write_properties(f, rel_type, props)?;
        }
        writeln!(f, "The relationships are the following:")?;
        for t in &self.relationships {
            writeln!(f, "(:{})-[:{}]->(:{})", t.start, t.rel_type, t.end)?;
        }
        Ok(())
    }
}
