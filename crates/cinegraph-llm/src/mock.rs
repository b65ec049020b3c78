//! MockProvider: deterministic LLM responses for testing
//!
//! Replays a scripted sequence of behaviors through the real streaming
//! interface, and records every request it receives so tests can assert
//! on prompts, temperature and call counts.

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::{LlmRequest, StreamDelta};
use async_stream::stream;
use serde_json::Value;
use std::sync::Mutex;

/// Mock behavior configuration
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return a text-only response
    Text(String),
    /// Return a tool_use call with given name and args
    ToolCall { name: String, args: Value },
    /// Return text followed by a tool call
    TextThenTool {
        text: String,
        tool_name: String,
        tool_args: Value,
    },
    /// Fail the request before streaming
    Error(String),
}

impl MockBehavior {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn tool(name: impl Into<String>, args: Value) -> Self {
        Self::ToolCall {
            name: name.into(),
            args,
        }
    }
}

/// A sequence of behaviors; each call to complete_stream pops the next one.
/// If the sequence is exhausted, returns the default behavior.
pub struct MockProvider {
    behaviors: Mutex<Vec<MockBehavior>>,
    default_behavior: MockBehavior,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// Create a mock that always returns the same behavior
    pub fn constant(behavior: MockBehavior) -> Self {
        Self {
            behaviors: Mutex::new(Vec::new()),
            default_behavior: behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with a sequence of behaviors (consumed in order)
    pub fn sequence(behaviors: Vec<MockBehavior>) -> Self {
        Self {
            behaviors: Mutex::new(behaviors),
            default_behavior: MockBehavior::Text("(mock: sequence exhausted)".into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completions requested so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Every request received, oldest first
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_behavior(&self, request: LlmRequest) -> MockBehavior {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match self.behaviors.lock() {
            Ok(mut behaviors) if !behaviors.is_empty() => behaviors.remove(0),
            _ => self.default_behavior.clone(),
        }
    }
}

fn tool_call_id() -> String {
    format!(
        "toolu_mock_{}",
        uuid::Uuid::new_v4().simple().to_string().get(..8).unwrap_or("0")
    )
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn models(&self) -> &[&str] {
        &["mock"]
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let behavior = self.next_behavior(request);

        if let MockBehavior::Error(e) = &behavior {
            return Err(LlmError::RequestFailed(e.clone()));
        }

        Ok(Box::pin(stream! {
            let (text, tool) = match behavior {
                MockBehavior::Text(text) => (Some(text), None),
                MockBehavior::ToolCall { name, args } => (None, Some((name, args))),
                MockBehavior::TextThenTool { text, tool_name, tool_args } => {
                    (Some(text), Some((tool_name, tool_args)))
                }
                MockBehavior::Error(_) => (None, None),
            };

            if let Some(text) = text {
                // Stream text in chunks like a real LLM
                for chunk in text.chars().collect::<Vec<_>>().chunks(20) {
                    yield Ok(StreamDelta::Text(chunk.iter().collect()));
                }
            }

            let stop_reason = if let Some((name, args)) = tool {
                let id = tool_call_id();
                yield Ok(StreamDelta::ToolCallStart { id: id.clone(), name });
                yield Ok(StreamDelta::ToolCallDelta { id: id.clone(), arguments: args.to_string() });
                yield Ok(StreamDelta::ToolCallEnd { id });
                "tool_use"
            } else {
                "end_turn"
            };

            yield Ok(StreamDelta::Done { stop_reason: Some(stop_reason.to_string()), usage: None });
        }))
    }
}
