//! Cinegraph Graph - the graph-query collaborator
//!
//! A `GraphClient` runs Cypher statements and describes its live schema.
//! `Neo4jGraph` talks to a Neo4j server over the HTTP transaction API;
//! `MemoryGraph` is an in-process stand-in holding a slice of the movie
//! graph, used by tests and offline runs.

pub mod client;
pub mod memory;
pub mod neo4j;
pub mod schema;
pub mod validate;

pub use client::{params, GraphClient, GraphError, GraphResult, Params, Record};
pub use memory::{movie_schema, MemoryGraph};
pub use neo4j::Neo4jGraph;
pub use schema::{GraphSchema, Property, RelationshipTriple};
pub use validate::{extract_cypher, validate_cypher, ValidationError};
