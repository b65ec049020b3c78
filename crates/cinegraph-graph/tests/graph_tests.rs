//! Validator and in-memory graph tests

use cinegraph_graph::{
    movie_schema, params, validate_cypher, GraphClient, GraphError, MemoryGraph, Params,
    ValidationError,
};
use serde_json::json;

const LOOKUP: &str = "MATCH (m:Movie|Person) WHERE m.title CONTAINS $candidate OR m.name CONTAINS $candidate RETURN m";
const LOOKUP_CI: &str = "MATCH (m:Movie|Person) WHERE toLower(coalesce(m.title, m.name)) CONTAINS toLower($candidate) RETURN m";

// ============================================================================
// Validation
// ============================================================================

#[test]
fn accepts_schema_conformant_statements() {
    let schema = movie_schema();
    for stmt in [
        "MATCH (a:Person)-[:ACTED_IN]->(:Movie) RETURN count(DISTINCT a)",
        "MATCH (m:Movie {title: 'Casino'})<-[:ACTED_IN]-(a) RETURN a.name",
        "MATCH (a:Person {name: 'Tom Hanks'})-[:ACTED_IN]->(m:Movie) RETURN count(m)",
        "MATCH (d:Person)-[:DIRECTED]->(m:Movie)<-[:ACTED_IN]-(a:Person) WHERE a.name STARTS WITH 'John' WITH d, COUNT(DISTINCT a) AS JohnsCount WHERE JohnsCount >= 3 RETURN d.name",
        "MATCH (p:Person)-[:DIRECTED]->(m:Movie), (p)-[:ACTED_IN]->(m) RETURN m.title, p.name",
        "MATCH (a:Person)-[:ACTED_IN]->(m:Movie) RETURN a.name, COUNT(m) AS movieCount ORDER BY movieCount DESC LIMIT 1",
    ] {
        assert_eq!(validate_cypher(stmt, &schema).as_deref(), Ok(stmt), "{}", stmt);
    }
}

#[test]
fn rejects_unknown_relationship_type() {
    let err = validate_cypher(
        "MATCH (p:Person)-[:STARRED_IN]->(m:Movie) RETURN p.name",
        &movie_schema(),
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::UnknownRelationship("STARRED_IN".into()));

    let err = validate_cypher(
        "MATCH (p:Person)-[r:ACTED_IN|CAMEO]->(m:Movie) RETURN p.name",
        &movie_schema(),
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::UnknownRelationship("CAMEO".into()));
}

#[test]
fn rejects_unknown_property() {
    let err = validate_cypher("MATCH (m:Movie) RETURN m.budget", &movie_schema()).unwrap_err();
    assert_eq!(err, ValidationError::UnknownProperty("budget".into()));

    let err = validate_cypher("MATCH (m:Movie {year: 1999}) RETURN m.title", &movie_schema())
        .unwrap_err();
    assert_eq!(err, ValidationError::UnknownProperty("year".into()));
}

#[test]
fn string_literals_are_not_inspected() {
    let stmt = "MATCH (p:Person) WHERE p.name = 'x.budget [:FOO]' RETURN p.name";
    assert!(validate_cypher(stmt, &movie_schema()).is_ok());
}

#[test]
fn backtick_quoted_names_are_checked() {
    let schema = movie_schema();

    let err = validate_cypher("MATCH (p:Person) RETURN p.`salary`", &schema).unwrap_err();
    assert_eq!(err, ValidationError::UnknownProperty("salary".into()));

    let err = validate_cypher("MATCH (p:Person {`salary`: 1}) RETURN p", &schema).unwrap_err();
    assert_eq!(err, ValidationError::UnknownProperty("salary".into()));

    let err = validate_cypher("MATCH (p)-[:`STARRED_IN`]->(m) RETURN m", &schema).unwrap_err();
    assert_eq!(err, ValidationError::UnknownRelationship("STARRED_IN".into()));

    let stmt = "MATCH (p:`Person`)-[:`ACTED_IN`]->(m:Movie) RETURN p.`name`, m.title";
    assert_eq!(validate_cypher(stmt, &schema).as_deref(), Ok(stmt));

    let corrected = validate_cypher("MATCH (m:Movie)-[:`ACTED_IN`]->(p:`Person`) RETURN p.name", &schema).unwrap();
    assert_eq!(corrected, "MATCH (m:Movie)<-[:`ACTED_IN`]-(p:`Person`) RETURN p.name");
}

#[test]
fn procedure_calls_params_and_map_literals_pass() {
    let schema = movie_schema();
    assert!(validate_cypher("CALL apoc.meta.data() YIELD label RETURN label", &schema).is_ok());
    assert!(validate_cypher("MATCH (p:Person) WHERE p.name = $person.fullName RETURN p", &schema).is_ok());
    assert!(validate_cypher("MATCH (p:Person) RETURN collect({who: p.name})", &schema).is_ok());
}

#[test]
fn flips_hop_written_against_schema_direction() {
    let corrected = validate_cypher(
        "MATCH (m:Movie)-[:ACTED_IN]->(p:Person) RETURN p.name",
        &movie_schema(),
    )
    .unwrap();
    assert_eq!(corrected, "MATCH (m:Movie)<-[:ACTED_IN]-(p:Person) RETURN p.name");

    let corrected = validate_cypher(
        "MATCH (p:Person)<-[:DIRECTED]-(m:Movie) RETURN m.title",
        &movie_schema(),
    )
    .unwrap();
    assert_eq!(corrected, "MATCH (p:Person)-[:DIRECTED]->(m:Movie) RETURN m.title");
}

#[test]
fn flip_resolves_labels_through_bindings() {
    let corrected = validate_cypher(
        "MATCH (m:Movie), (p:Person) MATCH (m)-[:WROTE]->(p) RETURN p.name",
        &movie_schema(),
    )
    .unwrap();
    assert_eq!(corrected, "MATCH (m:Movie), (p:Person) MATCH (m)<-[:WROTE]-(p) RETURN p.name");
}

#[test]
fn rejects_path_absent_in_both_directions() {
    let err = validate_cypher(
        "MATCH (p:Person)-[:FOLLOWS]->(m:Movie) RETURN m.title",
        &movie_schema(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownPath {
            start: "Person".into(),
            rel_type: "FOLLOWS".into(),
            end: "Movie".into(),
        }
    );
}

#[test]
fn undirected_hops_need_one_direction() {
    let schema = movie_schema();
    assert!(validate_cypher("MATCH (m:Movie)-[:ACTED_IN]-(p:Person) RETURN p.name", &schema).is_ok());
    assert!(validate_cypher("MATCH (m:Movie)-[:FOLLOWS]-(p:Person) RETURN p.name", &schema).is_err());
}

#[test]
fn empty_statement_is_rejected() {
    assert_eq!(validate_cypher("   ", &movie_schema()), Err(ValidationError::Empty));
}

// ============================================================================
// MemoryGraph
// ============================================================================

fn candidate(name: &str) -> Params {
    params([("candidate", name)])
}

#[tokio::test]
async fn lookup_aggregates_relationships() {
    let graph = MemoryGraph::movies();
    let rows = graph.query(LOOKUP, candidate("Sleepless")).await.unwrap();

    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r["title"] == "Sleepless in Seattle"));
    assert!(rows.iter().all(|r| r["label"] == "Movie" && r["year"] == 1993));
    let acted = rows.iter().find(|r| r["relationship"] == "ACTED_IN").unwrap();
    assert_eq!(acted["names"], json!(["Tom Hanks", "Meg Ryan"]));
}

#[tokio::test]
async fn lookup_takes_first_substring_match() {
    // "The Matrix" also matches "The Matrix Reloaded"; only the first node is used
    let graph = MemoryGraph::movies();
    let rows = graph.query(LOOKUP, candidate("The Matrix")).await.unwrap();
    assert!(rows.iter().all(|r| r["title"] == "The Matrix"));
}

#[tokio::test]
async fn lookup_case_policy_follows_statement() {
    let graph = MemoryGraph::movies();
    assert!(graph.query(LOOKUP, candidate("the matrix")).await.unwrap().is_empty());

    let rows = graph.query(LOOKUP_CI, candidate("the matrix")).await.unwrap();
    assert_eq!(rows[0]["title"], "The Matrix");
}

#[tokio::test]
async fn lookup_miss_is_empty_not_error() {
    let graph = MemoryGraph::movies();
    let rows = graph.query(LOOKUP, candidate("Casablanca")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn canned_responses_and_failures() {
    let graph = MemoryGraph::movies()
        .with_response(
            "MATCH (a:Person)-[:ACTED_IN]->(:Movie)\n RETURN count(DISTINCT a)",
            vec![json!({"count(DISTINCT a)": 102})],
        )
        .with_failure("MATCH (n) RETURN n.", "Invalid input");

    let rows = graph
        .query("MATCH (a:Person)-[:ACTED_IN]->(:Movie) RETURN count(DISTINCT a)", Params::new())
        .await
        .unwrap();
    assert_eq!(rows[0]["count(DISTINCT a)"], 102);

    let err = graph.query("MATCH (n) RETURN n.", Params::new()).await.unwrap_err();
    assert!(matches!(err, GraphError::Query { .. }));

    assert!(graph.query("MATCH (x) RETURN x", Params::new()).await.unwrap().is_empty());
    assert_eq!(graph.calls().len(), 3);
    assert_eq!(graph.executed_statements().len(), 3);
}

#[tokio::test]
async fn offline_graph_reports_unavailable() {
    let graph = MemoryGraph::movies().offline();
    assert!(matches!(
        graph.query(LOOKUP, candidate("Matrix")).await,
        Err(GraphError::Unavailable(_))
    ));
    assert!(matches!(graph.schema().await, Err(GraphError::Unavailable(_))));

    let core: cinegraph_core::Error = GraphError::Unavailable("down".into()).into();
    assert!(matches!(core, cinegraph_core::Error::CollaboratorUnavailable { .. }));
}

#[tokio::test]
async fn schema_is_fetched_per_call() {
    let graph = MemoryGraph::movies();
    let first = graph.schema().await.unwrap();
    let second = graph.schema().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(graph.schema_fetches(), 2);
    assert!(first.to_string().contains("(:Person)-[:ACTED_IN]->(:Movie)"));
}
