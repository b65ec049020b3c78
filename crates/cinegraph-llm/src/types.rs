//! LLM types for requests and streaming responses

use serde::{Deserialize, Serialize};

/// LLM request
#[derive(Clone, Debug, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<LlmTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Default for LlmRequest {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            messages: Vec::new(),
            tools: None,
            max_tokens: Some(1024),
            temperature: None,
            system: None,
        }
    }
}

impl LlmRequest {
    /// Single-prompt request decoded greedily: identical prompts yield identical output.
    pub fn deterministic(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![LlmMessage::user(prompt)],
            temperature: Some(0.0),
            ..Default::default()
        }
    }
}

/// Message in LLM conversation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LlmMessage {
    pub role: String,
    pub content: LlmContent,
}

impl LlmMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: LlmContent::Text(text.into()) }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: LlmContent::Text(text.into()) }
    }

    /// Plain text of the message, ignoring tool blocks.
    pub fn text(&self) -> String {
        match &self.content {
            LlmContent::Text(s) => s.clone(),
            LlmContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Message content - can be string or array of blocks
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LlmContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<String> for LlmContent {
    fn from(s: String) -> Self { LlmContent::Text(s) }
}

impl From<&str> for LlmContent {
    fn from(s: &str) -> Self { LlmContent::Text(s.to_string()) }
}

impl LlmContent {
    fn into_blocks(self) -> Vec<ContentBlock> {
        match self {
            LlmContent::Text(text) => vec![ContentBlock::Text { text }],
            LlmContent::Blocks(blocks) => blocks,
        }
    }
}

/// Content block types
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Tool definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmTool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Streaming delta from LLM
#[derive(Clone, Debug)]
pub enum StreamDelta {
    Text(String),
    Thinking(String),
    ToolCallStart { id: String, name: String },
    ToolCallDelta { id: String, arguments: String },
    ToolCallEnd { id: String },
    Done { stop_reason: Option<String>, usage: Option<Usage> },
    Error(String),
}

/// Token usage
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Accumulated tool call from streaming
#[derive(Clone, Debug, Default)]
pub struct AccumulatedToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl AccumulatedToolCall {
    /// Parse the streamed argument JSON. A call with no arguments parses as `{}`.
    pub fn parse_arguments(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// A fully drained completion.
#[derive(Clone, Debug, Default)]
pub struct Completion {
    pub text: String,
    pub tool_calls: Vec<AccumulatedToolCall>,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Merge consecutive messages from the same role into one.
///
/// Conversation history may contain back-to-back user turns (a feedback
/// directive followed by a question); providers expect roles to alternate.
pub fn merge_consecutive_roles(messages: &[LlmMessage]) -> Vec<LlmMessage> {
    let mut merged: Vec<LlmMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        match merged.last_mut() {
            Some(last) if last.role == message.role => {
                let previous = std::mem::replace(&mut last.content, LlmContent::Text(String::new()));
                last.content = match (previous, message.content.clone()) {
                    (LlmContent::Text(a), LlmContent::Text(b)) => {
                        LlmContent::Text(format!("{}\n\n{}", a, b))
                    }
                    (a, b) => {
                        let mut blocks = a.into_blocks();
                        blocks.extend(b.into_blocks());
                        LlmContent::Blocks(blocks)
                    }
                };
            }
            _ => merged.push(message.clone()),
        }
    }
    merged
}
