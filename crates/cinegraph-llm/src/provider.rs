//! LLM Provider trait

use crate::types::{AccumulatedToolCall, Completion, LlmRequest, StreamDelta};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::warn;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = LlmResult<StreamDelta>> + Send>>;

/// LLM Provider trait
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn models(&self) -> &[&str];

    fn supports_model(&self, model: &str) -> bool {
        self.models()
            .iter()
            .any(|m| *m == model || model.starts_with(m))
    }

    /// Stream a completion response.
    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream>;

    /// Drain a streamed completion into text plus any requested tool calls.
    ///
    /// Mid-stream errors abort the completion; a partial answer is never
    /// returned as if it were whole.
    async fn complete(&self, request: LlmRequest) -> LlmResult<Completion> {
        let mut stream = self.complete_stream(request).await?;

        let mut completion = Completion::default();
        let mut current_tool: Option<AccumulatedToolCall> = None;

        while let Some(delta) = stream.next().await {
            match delta? {
                StreamDelta::Text(text) => completion.text.push_str(&text),
                StreamDelta::Thinking(_) => {}
                StreamDelta::ToolCallStart { id, name } => {
                    current_tool = Some(AccumulatedToolCall {
                        id,
                        name,
                        arguments: String::new(),
                    });
                }
                StreamDelta::ToolCallDelta { arguments, .. } => {
                    if let Some(ref mut tool) = current_tool {
                        tool.arguments.push_str(&arguments);
                    }
                }
                StreamDelta::ToolCallEnd { .. } => {
                    if let Some(tool) = current_tool.take() {
                        completion.tool_calls.push(tool);
                    }
                }
                StreamDelta::Done { stop_reason, usage } => {
                    completion.stop_reason = stop_reason;
                    completion.usage = usage;
                }
                StreamDelta::Error(e) => return Err(LlmError::StreamError(e)),
            }
        }

        if let Some(tool) = current_tool {
            warn!(tool = %tool.name, "stream ended inside a tool call");
            completion.tool_calls.push(tool);
        }

        Ok(completion)
    }
}
