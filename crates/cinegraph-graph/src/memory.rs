//! In-process movie graph

use crate::client::{GraphClient, GraphError, GraphResult, Params, Record};
use crate::schema::GraphSchema;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Node {
    label: &'static str,
    key: String,
    year: Option<i64>,
}

/// A small graph that answers the entity lookup (any statement carrying a
/// `$candidate` parameter) by substring match, and any other statement
/// from canned responses. Unknown statements return no rows.
pub struct MemoryGraph {
    nodes: Vec<Node>,
    edges: Vec<(usize, String, usize)>,
    schema: GraphSchema,
    responses: HashMap<String, GraphResult<Vec<Record>>>,
    offline: bool,
    calls: Mutex<Vec<(String, Params)>>,
    schema_fetches: AtomicUsize,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::empty()
    }
}

impl MemoryGraph {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            schema: movie_schema(),
            responses: HashMap::new(),
            offline: false,
            calls: Mutex::new(Vec::new()),
            schema_fetches: AtomicUsize::new(0),
        }
    }

    /// A slice of the Neo4j movie sample graph.
    pub fn movies() -> Self {
        let mut g = Self::empty();
        let matrix = g.movie("The Matrix", 1999);
        let reloaded = g.movie("The Matrix Reloaded", 2003);
        let sleepless = g.movie("Sleepless in Seattle", 1993);
        let polar = g.movie("The Polar Express", 2004);

        for actor in ["Keanu Reeves", "Carrie-Anne Moss", "Laurence Fishburne", "Hugo Weaving"] {
            let p = g.person(actor);
            g.link(p, "ACTED_IN", matrix);
            g.link(p, "ACTED_IN", reloaded);
        }
        for director in ["Lana Wachowski", "Lilly Wachowski"] {
            let p = g.person(director);
            g.link(p, "DIRECTED", matrix);
            g.link(p, "DIRECTED", reloaded);
        }
        let silver = g.person("Joel Silver");
        g.link(silver, "PRODUCED", matrix);
        g.link(silver, "PRODUCED", reloaded);

        let hanks = g.person("Tom Hanks");
        let ryan = g.person("Meg Ryan");
        let ephron = g.person("Nora Ephron");
        let zemeckis = g.person("Robert Zemeckis");
        g.link(hanks, "ACTED_IN", sleepless);
        g.link(ryan, "ACTED_IN", sleepless);
        g.link(ephron, "DIRECTED", sleepless);
        g.link(ephron, "WROTE", sleepless);
        g.link(hanks, "ACTED_IN", polar);
        g.link(zemeckis, "DIRECTED", polar);
        g
    }

    fn movie(&mut self, title: &str, released: i64) -> usize {
        self.nodes.push(Node { label: "Movie", key: title.into(), year: Some(released) });
        self.nodes.len() - 1
    }

    fn person(&mut self, name: &str) -> usize {
        self.nodes.push(Node { label: "Person", key: name.into(), year: None });
        self.nodes.len() - 1
    }

    fn link(&mut self, from: usize, rel: &str, to: usize) {
        self.edges.push((from, rel.into(), to));
    }

    pub fn with_schema(mut self, schema: GraphSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Answer `statement` with `rows`. Whitespace differences are ignored.
    pub fn with_response(mut self, statement: &str, rows: Vec<Value>) -> Self {
        let records = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.responses.insert(normalize(statement), Ok(records));
        self
    }

    /// Fail `statement` with a syntax error carrying `message`.
    pub fn with_failure(mut self, statement: &str, message: &str) -> Self {
        self.responses.insert(
            normalize(statement),
            Err(GraphError::query("Neo.ClientError.Statement.SyntaxError", message)),
        );
        self
    }

    /// Every call fails as if the server were down.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Statements executed other than the entity lookup.
    pub fn executed_statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, params)| !params.contains_key("candidate"))
            .map(|(s, _)| s)
            .collect()
    }

    pub fn schema_fetches(&self) -> usize {
        self.schema_fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, candidate: &str, case_insensitive: bool) -> Vec<Record> {
        let matches = |key: &str| {
            if case_insensitive {
                key.to_lowercase().contains(&candidate.to_lowercase())
            } else {
                key.contains(candidate)
            }
        };
        let Some(idx) = self.nodes.iter().position(|n| matches(&n.key)) else {
            return Vec::new();
        };
        let node = &self.nodes[idx];

        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for (from, rel, to) in &self.edges {
            let other = if *from == idx {
                *to
            } else if *to == idx {
                *from
            } else {
                continue;
            };
            let name = self.nodes[other].key.clone();
            match groups.iter_mut().find(|(r, _)| r == rel) {
                Some((_, names)) => names.push(name),
                None => groups.push((rel.clone(), vec![name])),
            }
        }

        let row = |relationship: Value, names: Vec<String>| -> Record {
            let value = json!({
                "label": node.label,
                "title": node.key,
                "year": node.year,
                "relationship": relationship,
                "names": names,
            });
            match value {
                Value::Object(map) => map,
                _ => Record::new(),
            }
        };

        if groups.is_empty() {
            return vec![row(Value::Null, Vec::new())];
        }
        groups
            .into_iter()
            .map(|(rel, names)| row(Value::String(rel), names))
            .collect()
    }
}

fn normalize(statement: &str) -> String {
    statement.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The movie graph schema as `apoc.meta.data()` reports it.
pub fn movie_schema() -> GraphSchema {
    GraphSchema::default()
        .with_node("Movie", &[("title", "STRING"), ("released", "INTEGER"), ("tagline", "STRING")])
        .with_node("Person", &[("name", "STRING"), ("born", "INTEGER")])
        .with_relationship_properties("ACTED_IN", &[("roles", "LIST")])
        .with_relationship_properties("REVIEWED", &[("summary", "STRING"), ("rating", "INTEGER")])
        .with_relationship("Person", "ACTED_IN", "Movie")
        .with_relationship("Person", "DIRECTED", "Movie")
        .with_relationship("Person", "PRODUCED", "Movie")
        .with_relationship("Person", "WROTE", "Movie")
        .with_relationship("Person", "REVIEWED", "Movie")
        .with_relationship("Person", "FOLLOWS", "Person")
}

#[async_trait::async_trait]
impl GraphClient for MemoryGraph {
    async fn query(&self, statement: &str, params: Params) -> GraphResult<Vec<Record>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((statement.to_string(), params.clone()));
        }
        if self.offline {
            return Err(GraphError::Unavailable("connection refused".into()));
        }

        if let Some(Value::String(candidate)) = params.get("candidate") {
            return Ok(self.lookup(candidate, statement.contains("toLower")));
        }

        match self.responses.get(&normalize(statement)) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(GraphError::Query { code, message })) => {
                Err(GraphError::query(code.clone(), message.clone()))
            }
            Some(Err(other)) => Err(GraphError::InvalidResponse(other.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn schema(&self) -> GraphResult<GraphSchema> {
        self.schema_fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(GraphError::Unavailable("connection refused".into()));
        }
        Ok(self.schema.clone())
    }
}
