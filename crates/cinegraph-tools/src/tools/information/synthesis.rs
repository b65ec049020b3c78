//! Few-shot Cypher synthesis

use super::prompts::{CYPHER_PREFIX, CYPHER_SUFFIX, EXAMPLES, EXAMPLE_TEMPLATE};
use cinegraph_core::{Error, Result};
use cinegraph_graph::{extract_cypher, GraphSchema};
use cinegraph_llm::{LlmProvider, LlmRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A question paired with a known-correct statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExample {
    pub question: String,
    pub query: String,
}

impl QueryExample {
    pub fn new(question: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            query: query.into(),
        }
    }

    /// The built-in movie-graph exemplars.
    pub fn defaults() -> Vec<Self> {
        EXAMPLES.iter().map(|(q, s)| Self::new(*q, *s)).collect()
    }
}

/// Prefix with the schema, each exemplar, then the question.
/// Pure: equal inputs give byte-identical prompts.
pub fn build_prompt(question: &str, schema: &str, examples: &[QueryExample]) -> String {
    let mut sections = Vec::with_capacity(examples.len() + 2);
    sections.push(CYPHER_PREFIX.replace("{schema}", schema));
    for example in examples {
        sections.push(
            EXAMPLE_TEMPLATE
                .replace("{question}", &example.question)
                .replace("{query}", &example.query),
        );
    }
    sections.push(CYPHER_SUFFIX.replace("{question}", question));
    sections.join("\n\n")
}

pub struct QuerySynthesizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    examples: Vec<QueryExample>,
}

impl QuerySynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            examples: QueryExample::defaults(),
        }
    }

    /// Produce one Cypher statement for `question`, decoded at temperature 0.
    /// The statement is not validated here.
    pub async fn synthesize(&self, question: &str, schema: &GraphSchema) -> Result<String> {
        let prompt = build_prompt(question, &schema.to_string(), &self.examples);
        let request = LlmRequest::deterministic(self.model.clone(), prompt);

        let completion = self
            .provider
            .complete(request)
            .await
            .map_err(|e| Error::llm(self.provider.name(), e.to_string()))?;

        let statement = extract_cypher(&completion.text);
        if statement.is_empty() {
            return Err(Error::QuerySynthesis("model returned no statement".into()));
        }
        debug!(%statement, "synthesized cypher");
        Ok(statement)
    }
}
