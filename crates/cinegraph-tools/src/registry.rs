//! Capability set and dispatch

use crate::tools::information::InformationTool;
use cinegraph_llm::LlmTool;
use serde_json::Value;

#[derive(Clone, Debug)]
pub enum ToolResult {
    Text(String),
    Error(String),
}

impl ToolResult {
    pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }
    pub fn error(s: impl Into<String>) -> Self { Self::Error(s.into()) }

    pub fn to_content_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Error(e) => format!("Error: {}", e),
        }
    }

    pub fn is_error(&self) -> bool { matches!(self, Self::Error(_)) }
}

/// One callable capability.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable description sent to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> Value;

    /// Run the capability. Bad arguments come back as `ToolResult::Error`.
    async fn execute(&self, args: Value) -> ToolResult;

    fn to_llm_tool(&self) -> LlmTool {
        LlmTool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// The capabilities the agent may call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Look up movies and people in the graph database.
    Information,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[Capability::Information];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Information => "Information",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

pub struct CapabilityRegistry {
    information: InformationTool,
}

impl CapabilityRegistry {
    pub fn new(information: InformationTool) -> Self {
        Self { information }
    }

    pub fn tool(&self, capability: Capability) -> &dyn Tool {
        match capability {
            Capability::Information => &self.information,
        }
    }

    /// Resolve a model-supplied name against the closed set.
    pub fn resolve(&self, name: &str) -> Option<Capability> {
        Capability::from_name(name)
    }

    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        match self.resolve(name) {
            Some(capability) => self.tool(capability).execute(args).await,
            None => ToolResult::Error(format!("Tool not found: {}", name)),
        }
    }

    /// LLM tool definitions for every capability.
    pub fn get_definitions(&self) -> Vec<LlmTool> {
        Capability::ALL
            .iter()
            .map(|c| self.tool(*c).to_llm_tool())
            .collect()
    }
}
