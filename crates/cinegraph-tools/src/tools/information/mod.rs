//! Information capability: entity lookup with query-synthesis fallback

pub mod execute;
pub mod lookup;
pub mod prompts;
pub mod synthesis;

pub use execute::QueryExecutor;
pub use lookup::{EntityResolver, Lookup};
pub use synthesis::{build_prompt, QueryExample, QuerySynthesizer};

use crate::registry::{Tool, ToolResult};
use cinegraph_core::{CinegraphConfig, UNKNOWN_ANSWER};
use cinegraph_graph::GraphClient;
use cinegraph_llm::LlmProvider;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves a question about one entity.
///
/// The cheap template lookup runs first; only on a miss is a statement
/// synthesized from the full user input and executed. Never fails: an
/// unanswerable question yields the "I don't know the answer" sentinel.
pub struct ResolutionOrchestrator {
    graph: Arc<dyn GraphClient>,
    resolver: EntityResolver,
    synthesizer: QuerySynthesizer,
    executor: QueryExecutor,
}

impl ResolutionOrchestrator {
    pub fn new(
        graph: Arc<dyn GraphClient>,
        resolver: EntityResolver,
        synthesizer: QuerySynthesizer,
        executor: QueryExecutor,
    ) -> Self {
        Self {
            graph,
            resolver,
            synthesizer,
            executor,
        }
    }

    /// Wire the three stages from configuration.
    pub fn from_config(
        graph: Arc<dyn GraphClient>,
        provider: Arc<dyn LlmProvider>,
        config: &CinegraphConfig,
    ) -> Self {
        let model = config.llm.model.clone();
        Self::new(
            graph.clone(),
            EntityResolver::new(graph.clone(), config.lookup.case_insensitive),
            QuerySynthesizer::new(provider.clone(), model.clone()),
            QueryExecutor::new(graph, provider, model, config.qa.top_k),
        )
    }

    pub async fn resolve(&self, entity: &str, user_input: &str) -> String {
        match self.resolver.lookup(entity).await {
            Ok(Lookup::Context(context)) => {
                info!(entity, "answered from entity lookup");
                return context;
            }
            Ok(Lookup::NotFound) => debug!(entity, "no entity match, synthesizing query"),
            Err(e) => warn!(entity, error = %e, "entity lookup failed, synthesizing query"),
        }

        let schema = match self.graph.schema().await {
            Ok(schema) => schema,
            Err(e) => {
                warn!(error = %e, "schema unavailable");
                return UNKNOWN_ANSWER.to_string();
            }
        };

        let statement = match self.synthesizer.synthesize(user_input, &schema).await {
            Ok(statement) => statement,
            Err(e) => {
                warn!(error = %e, "query synthesis failed");
                return UNKNOWN_ANSWER.to_string();
            }
        };

        self.executor.execute(&statement, user_input, &schema).await
    }
}

/// Arguments the model supplies when calling Information.
#[derive(Clone, Debug, Deserialize)]
pub struct InformationArgs {
    pub entity: String,
    pub user_input: String,
}

pub struct InformationTool {
    orchestrator: Arc<ResolutionOrchestrator>,
}

impl InformationTool {
    pub fn new(orchestrator: Arc<ResolutionOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait::async_trait]
impl Tool for InformationTool {
    fn name(&self) -> &str {
        "Information"
    }

    fn description(&self) -> &str {
        "Tool to query information about entities like movies or people."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entity": {
                    "type": "string",
                    "description": "The specific entity in question, such as a movie title or a person's name. \
                                    Accepts lowercase and uppercase text. Name a single, distinct entity."
                },
                "user_input": {
                    "type": "string",
                    "description": "Direct user input in natural language."
                }
            },
            "required": ["entity", "user_input"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: InformationArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolResult::error(format!("Invalid arguments for Information: {}", e)),
        };
        ToolResult::text(self.orchestrator.resolve(&args.entity, &args.user_input).await)
    }
}
