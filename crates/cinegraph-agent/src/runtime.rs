//! Agent runtime - the tool-calling decision loop

use crate::history::format_turns;
use cinegraph_core::{AgentSettings, CinegraphConfig, Error, Result, Turn, NOT_IN_DATABASE};
use cinegraph_llm::{ContentBlock, LlmContent, LlmMessage, LlmProvider, LlmRequest, LlmTool};
use cinegraph_tools::{CapabilityRegistry, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SYSTEM_PROMPT: &str = "\
You are a helpful assistant that finds information about movies, actors, directors, etc., from the graph database. \
Each user input must be processed by querying the graph database using the Information tool. \
Ensure each response is directly derived from the database query results. \
Before finalizing any response, confirm a query to the database has been made. \
If a user input does not trigger a database query, reprocess the input to include such a query. \
Ask for clarification and provide options for further refinement if the tool needs follow-up questions to refine the user's request. \
Act only on the user's specific requests. \
If the specified information is not present in the database, respond with \
'I don't know because this information isn't there in the database'.";

const GROUNDING_REMINDER: &str = "\
That answer was not taken from the database. Call the Information tool for this request \
and answer only from its result.";

const MAX_TOOL_RESULT_CHARS: usize = 50_000;

pub struct AgentConfig {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub settings: AgentSettings,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_config(&CinegraphConfig::default())
    }
}

impl AgentConfig {
    pub fn from_config(config: &CinegraphConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            system_prompt: SYSTEM_PROMPT.to_string(),
            settings: config.agent.clone(),
        }
    }
}

/// One capability call made during a turn.
#[derive(Clone, Debug)]
pub struct ToolStep {
    pub name: String,
    pub args: Value,
    pub result: String,
    pub is_error: bool,
}

#[derive(Clone, Debug)]
pub struct TurnOutput {
    pub output: String,
    pub steps: Vec<ToolStep>,
}

impl TurnOutput {
    /// True when at least one capability call succeeded.
    pub fn grounded(&self) -> bool {
        self.steps.iter().any(|s| !s.is_error)
    }
}

pub struct AgentRuntime {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<CapabilityRegistry>,
    config: AgentConfig,
}

impl AgentRuntime {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: CapabilityRegistry, config: AgentConfig) -> Self {
        Self {
            provider,
            tools: Arc::new(tools),
            config,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }
    pub fn tools(&self) -> &Arc<CapabilityRegistry> {
        &self.tools
    }
    pub fn tool_definitions(&self) -> Vec<LlmTool> {
        self.tools.get_definitions()
    }
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one user turn against the given history.
    ///
    /// Loops until the model answers without requesting a capability. An
    /// answer given before any successful capability call is sent back
    /// with a reminder, up to `grounding_retries` times, after which the
    /// turn answers with the not-in-database sentinel.
    pub async fn run_turn(&self, input: &str, history: &[Turn]) -> Result<TurnOutput> {
        let settings = &self.config.settings;
        let mut messages = format_turns(history, settings.window());
        messages.push(LlmMessage::user(input));

        let mut steps: Vec<ToolStep> = Vec::new();
        let mut grounded = false;
        let mut retries = 0;

        for iteration in 1..=settings.max_iterations {
            let request = LlmRequest {
                model: self.config.model.clone(),
                messages: messages.clone(),
                tools: Some(self.tools.get_definitions()),
                max_tokens: Some(self.config.max_tokens),
                system: Some(self.config.system_prompt.clone()),
                ..Default::default()
            };

            let completion = self
                .provider
                .complete(request)
                .await
                .map_err(|e| Error::llm(self.provider.name(), e.to_string()))?;
            let text = completion.text.trim().to_string();

            if !completion.wants_tools() {
                if grounded {
                    info!(iterations = iteration, tool_calls = steps.len(), "Turn complete");
                    return Ok(TurnOutput { output: text, steps });
                }
                if retries >= settings.grounding_retries {
                    warn!(retries, "answer never grounded in a database call");
                    return Ok(TurnOutput {
                        output: NOT_IN_DATABASE.to_string(),
                        steps,
                    });
                }
                retries += 1;
                debug!(retries, "ungrounded answer, asking again");
                if !text.is_empty() {
                    messages.push(LlmMessage::assistant(text));
                }
                messages.push(LlmMessage::user(GROUNDING_REMINDER));
                continue;
            }

            let mut blocks = Vec::with_capacity(completion.tool_calls.len() + 1);
            if !text.is_empty() {
                blocks.push(ContentBlock::Text { text });
            }
            let mut results = Vec::with_capacity(completion.tool_calls.len());

            for tc in &completion.tool_calls {
                let (args, result) = match tc.parse_arguments() {
                    Ok(args) => {
                        let result = self.tools.execute(&tc.name, args.clone()).await;
                        (args, result)
                    }
                    Err(e) => (
                        json!({}),
                        ToolResult::error(format!("Invalid JSON arguments: {}", e)),
                    ),
                };
                let is_error = result.is_error();
                let content = truncate(result.to_content_string());
                debug!(tool = %tc.name, is_error, "capability executed");

                grounded |= !is_error;
                blocks.push(ContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input: args.clone(),
                });
                results.push(ContentBlock::ToolResult {
                    tool_use_id: tc.id.clone(),
                    content: content.clone(),
                    is_error: is_error.then_some(true),
                });
                steps.push(ToolStep {
                    name: tc.name.clone(),
                    args,
                    result: content,
                    is_error,
                });
            }

            messages.push(LlmMessage {
                role: "assistant".into(),
                content: LlmContent::Blocks(blocks),
            });
            messages.push(LlmMessage {
                role: "user".into(),
                content: LlmContent::Blocks(results),
            });
            debug!("Tool calls executed, continuing loop (iteration {})", iteration);
        }

        Err(Error::IterationLimit(settings.max_iterations))
    }
}

fn truncate(s: String) -> String {
    if s.len() <= MAX_TOOL_RESULT_CHARS {
        return s;
    }
    let mut end = MAX_TOOL_RESULT_CHARS;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...\n[truncated, {} total chars]", &s[..end], s.len())
}
