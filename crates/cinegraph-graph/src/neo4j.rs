//! Neo4j driver over the HTTP transaction API

use crate::client::{GraphClient, GraphError, GraphResult, Params, Record};
use crate::schema::GraphSchema;
use cinegraph_core::GraphConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

const NODE_PROPERTIES_QUERY: &str = "\
CALL apoc.meta.data()
YIELD label, elementType, type, property
WHERE type <> 'RELATIONSHIP' AND elementType = 'node'
WITH label, collect({property: property, type: type}) AS properties
RETURN {labels: label, properties: properties} AS output";

const REL_PROPERTIES_QUERY: &str = "\
CALL apoc.meta.data()
YIELD label, elementType, type, property
WHERE type <> 'RELATIONSHIP' AND elementType = 'relationship'
WITH label, collect({property: property, type: type}) AS properties
RETURN {type: label, properties: properties} AS output";

const RELATIONSHIPS_QUERY: &str = "\
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE type = 'RELATIONSHIP' AND elementType = 'node'
UNWIND other AS target
RETURN {start: label, type: property, end: toString(target)} AS output";

pub struct Neo4jGraph {
    client: Client,
    endpoint: String,
    username: String,
    password: Option<String>,
}

impl Neo4jGraph {
    /// Connect and verify the server answers. Fails fast on a bad URL,
    /// wrong credentials, or an unreachable server.
    pub async fn connect(config: &GraphConfig) -> GraphResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| GraphError::InvalidUrl("no graph url configured".into()))?;
        let graph = Self {
            client: Client::new(),
            endpoint: transaction_endpoint(url, &config.database)?,
            username: config.username.clone(),
            password: config.password.clone(),
        };

        graph.query("RETURN 1 AS ok", Params::new()).await.map_err(|e| match e {
            GraphError::Network(e) => GraphError::Unavailable(e.to_string()),
            other => other,
        })?;
        info!(endpoint = %graph.endpoint, "Connected to Neo4j");
        Ok(graph)
    }
}

/// Map a server URL onto `.../db/{database}/tx/commit`.
///
/// Bolt-style schemes are translated to the HTTP connector on its default
/// port (7474 plain, 7473 TLS).
pub fn transaction_endpoint(url: &str, database: &str) -> GraphResult<String> {
    let parsed = Url::parse(url).map_err(|e| GraphError::InvalidUrl(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| GraphError::InvalidUrl(format!("{}: missing host", url)))?;

    let (scheme, port) = match parsed.scheme() {
        "http" | "https" => (parsed.scheme(), parsed.port()),
        "bolt" | "neo4j" => ("http", Some(7474)),
        "bolt+s" | "neo4j+s" | "bolt+ssc" | "neo4j+ssc" => ("https", Some(7473)),
        other => return Err(GraphError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    };

    let authority = match port {
        Some(p) => format!("{}:{}", host, p),
        None => host.to_string(),
    };
    Ok(format!("{}://{}/db/{}/tx/commit", scheme, authority, database))
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: [TxStatement<'a>; 1],
}

#[derive(Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: &'a Params,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

fn into_records(response: TxResponse) -> GraphResult<Vec<Record>> {
    if let Some(err) = response.errors.into_iter().next() {
        return Err(GraphError::query(err.code, err.message));
    }
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GraphError::InvalidResponse("no result set".into()))?;

    Ok(result
        .data
        .into_iter()
        .map(|row| result.columns.iter().cloned().zip(row.row).collect())
        .collect())
}

#[async_trait::async_trait]
impl GraphClient for Neo4jGraph {
    async fn query(&self, statement: &str, params: Params) -> GraphResult<Vec<Record>> {
        debug!(statement, "Neo4j query");

        let body = TxRequest {
            statements: [TxStatement {
                statement,
                parameters: &params,
                result_data_contents: ["row"],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, self.password.as_ref())
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Neo4j error {}: {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => GraphError::AuthFailed(error_text),
                _ => GraphError::Unavailable(format!("{}: {}", status, error_text)),
            });
        }

        let parsed: TxResponse = response
            .json()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;
        into_records(parsed)
    }

    async fn schema(&self) -> GraphResult<GraphSchema> {
        let nodes = self.query(NODE_PROPERTIES_QUERY, Params::new()).await?;
        let rel_properties = self.query(REL_PROPERTIES_QUERY, Params::new()).await?;
        let triples = self.query(RELATIONSHIPS_QUERY, Params::new()).await?;
        Ok(GraphSchema::from_meta(&nodes, &rel_properties, &triples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_from_bolt_and_http() {
        assert_eq!(
            transaction_endpoint("bolt://localhost:7687", "neo4j").unwrap(),
            "http://localhost:7474/db/neo4j/tx/commit"
        );
        assert_eq!(
            transaction_endpoint("neo4j+s://demo.databases.neo4j.io", "movies").unwrap(),
            "https://demo.databases.neo4j.io:7473/db/movies/tx/commit"
        );
        assert_eq!(
            transaction_endpoint("http://10.0.0.5:7474", "neo4j").unwrap(),
            "http://10.0.0.5:7474/db/neo4j/tx/commit"
        );
        assert!(transaction_endpoint("ftp://host", "neo4j").is_err());
        assert!(transaction_endpoint("not a url", "neo4j").is_err());
    }

    #[test]
    fn records_zip_columns_and_rows() {
        let response: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["name", "born"],
                "data": [{"row": ["Keanu Reeves", 1964], "meta": [null, null]}]
            }],
            "errors": []
        }))
        .unwrap();
        let records = into_records(response).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Keanu Reeves");
        assert_eq!(records[0]["born"], 1964);
    }

    #[test]
    fn server_errors_become_query_errors() {
        let response: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "Invalid input"}]
        }))
        .unwrap();
        let err = into_records(response).unwrap_err();
        assert!(matches!(err, GraphError::Query { ref code, .. } if code.contains("SyntaxError")));
    }
}
