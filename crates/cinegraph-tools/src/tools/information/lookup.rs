//! Entity lookup by name or title

use super::prompts::{LOOKUP_QUERY, LOOKUP_QUERY_CASE_INSENSITIVE};
use cinegraph_graph::{params, GraphClient, GraphResult, Record};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Aggregated description of the first matching node.
    Context(String),
    NotFound,
}

pub struct EntityResolver {
    graph: Arc<dyn GraphClient>,
    case_insensitive: bool,
}

impl EntityResolver {
    pub fn new(graph: Arc<dyn GraphClient>, case_insensitive: bool) -> Self {
        Self { graph, case_insensitive }
    }

    pub fn statement(&self) -> &'static str {
        if self.case_insensitive {
            LOOKUP_QUERY_CASE_INSENSITIVE
        } else {
            LOOKUP_QUERY
        }
    }

    /// One query, no retry. Zero matches is `NotFound`, not an error.
    ///
    /// A blank candidate would be contained in every name, so it is a miss
    /// without touching the graph.
    pub async fn lookup(&self, candidate: &str) -> GraphResult<Lookup> {
        if candidate.trim().is_empty() {
            debug!("blank entity, skipping lookup");
            return Ok(Lookup::NotFound);
        }

        let rows = self
            .graph
            .query(self.statement(), params([("candidate", candidate)]))
            .await?;

        match render_context(&rows) {
            Some(context) => Ok(Lookup::Context(context)),
            None => {
                debug!(candidate, "entity lookup miss");
                Ok(Lookup::NotFound)
            }
        }
    }
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Render lookup rows as
///
/// ```text
/// type:Movie
/// title: The Matrix
/// year: 1999
/// ACTED_IN: Keanu Reeves, Carrie-Anne Moss
/// ```
fn render_context(rows: &[Record]) -> Option<String> {
    let first = rows.first()?;
    let mut out = format!(
        "type:{}\ntitle: {}\nyear: {}\n",
        scalar(first.get("label")),
        scalar(first.get("title")),
        scalar(first.get("year")),
    );

    for row in rows {
        let Some(Value::String(relationship)) = row.get("relationship") else {
            continue;
        };
        let names: Vec<String> = row
            .get("names")
            .and_then(Value::as_array)
            .map(|names| names.iter().map(|n| scalar(Some(n))).collect())
            .unwrap_or_default();
        out.push_str(&format!("{}: {}\n", relationship, names.join(", ")));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn renders_person_without_year() {
        let rows = vec![
            record(json!({"label": "Person", "title": "Nora Ephron", "year": null,
                          "relationship": "DIRECTED", "names": ["Sleepless in Seattle"]})),
            record(json!({"label": "Person", "title": "Nora Ephron", "year": null,
                          "relationship": "WROTE", "names": ["Sleepless in Seattle"]})),
        ];
        assert_eq!(
            render_context(&rows).unwrap(),
            "type:Person\ntitle: Nora Ephron\nyear: \nDIRECTED: Sleepless in Seattle\nWROTE: Sleepless in Seattle\n"
        );
    }

    #[test]
    fn node_without_relationships_still_renders() {
        let rows = vec![record(json!({"label": "Movie", "title": "Solo", "year": 2018,
                                      "relationship": null, "names": []}))];
        assert_eq!(render_context(&rows).unwrap(), "type:Movie\ntitle: Solo\nyear: 2018\n");
        assert!(render_context(&[]).is_none());
    }
}
