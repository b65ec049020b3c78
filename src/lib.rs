//! cinegraph - a movie knowledge-graph chatbot
//!
//! The binary wires a Neo4j graph and an Anthropic model into the agent;
//! this library holds the pieces it drives (runtime assembly, the chat
//! REPL and the scripted demos) so they can be exercised with doubles.

pub mod chat;
pub mod demos;

use cinegraph_agent::{AgentConfig, AgentRuntime};
use cinegraph_core::CinegraphConfig;
use cinegraph_graph::GraphClient;
use cinegraph_llm::LlmProvider;
use cinegraph_tools::{CapabilityRegistry, InformationTool, ResolutionOrchestrator};
use std::sync::Arc;

/// Construct the agent once, with its collaborators passed in explicitly.
pub fn build_runtime(
    graph: Arc<dyn GraphClient>,
    provider: Arc<dyn LlmProvider>,
    config: &CinegraphConfig,
) -> Arc<AgentRuntime> {
    let orchestrator = Arc::new(ResolutionOrchestrator::from_config(graph, provider.clone(), config));
    let registry = CapabilityRegistry::new(InformationTool::new(orchestrator));
    Arc::new(AgentRuntime::new(provider, registry, AgentConfig::from_config(config)))
}
