//! Graph client trait and result types

use crate::schema::GraphSchema;
use serde_json::{Map, Value};

/// One result row: column name → value.
pub type Record = Map<String, Value>;

/// Named statement parameters (`$candidate` etc.).
pub type Params = Map<String, Value>;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph unavailable: {0}")]
    Unavailable(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("query failed ({code}): {message}")]
    Query { code: String, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GraphError {
    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<GraphError> for cinegraph_core::Error {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Unavailable(m) | GraphError::AuthFailed(m) => {
                cinegraph_core::Error::unavailable("graph", m)
            }
            GraphError::Network(e) => cinegraph_core::Error::unavailable("graph", e.to_string()),
            other => cinegraph_core::Error::Graph(other.to_string()),
        }
    }
}

/// Build a parameter map from `(name, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The graph-query collaborator.
///
/// An empty result set is `Ok(vec![])`; only malformed statements and
/// transport failures are errors.
#[async_trait::async_trait]
pub trait GraphClient: Send + Sync {
    async fn query(&self, statement: &str, params: Params) -> GraphResult<Vec<Record>>;

    /// Fetch the live schema. Implementations must not serve a stale copy.
    async fn schema(&self) -> GraphResult<GraphSchema>;
}
