//! Validated execution and answer generation

use super::prompts::QA_PROMPT;
use cinegraph_core::{Error, Result, UNKNOWN_ANSWER};
use cinegraph_graph::{validate_cypher, GraphClient, GraphSchema, Params};
use cinegraph_llm::{LlmProvider, LlmRequest};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct QueryExecutor {
    graph: Arc<dyn GraphClient>,
    provider: Arc<dyn LlmProvider>,
    model: String,
    top_k: usize,
}

impl QueryExecutor {
    pub fn new(
        graph: Arc<dyn GraphClient>,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            graph,
            provider,
            model: model.into(),
            top_k,
        }
    }

    /// Validate against `schema`, run and answer. Never fails: every error
    /// becomes the "I don't know the answer" sentinel.
    ///
    /// `schema` should be the one the statement was synthesized from.
    pub async fn execute(&self, statement: &str, question: &str, schema: &GraphSchema) -> String {
        match self.try_execute(statement, question, schema).await {
            Ok(answer) => answer,
            Err(e @ Error::QuerySynthesis(_)) => {
                warn!(%statement, error = %e, "synthesized query rejected");
                UNKNOWN_ANSWER.to_string()
            }
            Err(e) => {
                warn!(%statement, error = %e, "query execution failed");
                UNKNOWN_ANSWER.to_string()
            }
        }
    }

    async fn try_execute(&self, statement: &str, question: &str, schema: &GraphSchema) -> Result<String> {
        let statement = validate_cypher(statement, schema)
            .map_err(|e| Error::QuerySynthesis(e.to_string()))?;

        let mut rows = self.graph.query(&statement, Params::new()).await?;
        debug!(%statement, rows = rows.len(), "query executed");
        if rows.is_empty() {
            return Ok(UNKNOWN_ANSWER.to_string());
        }
        rows.truncate(self.top_k);

        let context = serde_json::to_string(&rows.into_iter().map(Value::Object).collect::<Vec<_>>())?;
        let prompt = QA_PROMPT
            .replace("{context}", &context)
            .replace("{question}", question);

        let completion = self
            .provider
            .complete(LlmRequest::deterministic(self.model.clone(), prompt))
            .await
            .map_err(|e| Error::llm(self.provider.name(), e.to_string()))?;

        let answer = completion.text.trim();
        if answer.is_empty() {
            return Ok(UNKNOWN_ANSWER.to_string());
        }
        Ok(answer.to_string())
    }
}
