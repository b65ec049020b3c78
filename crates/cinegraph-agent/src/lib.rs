//! Cinegraph Agent - the decision loop, conversation history and turn driver

pub mod conversation;
pub mod history;
pub mod runtime;

pub use conversation::{Conversation, PendingTurn, Reply};
pub use history::History;
pub use runtime::{AgentConfig, AgentRuntime, ToolStep, TurnOutput};
