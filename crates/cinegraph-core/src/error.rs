//! Error types for Cinegraph

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: String,
        message: String,
    },

    #[error("query synthesis error: {0}")]
    QuerySynthesis(String),

    #[error("malformed history: {0}")]
    MalformedHistory(String),

    #[error("turn exceeded {0} model calls without a final answer")]
    IterationLimit(usize),

    #[error("llm error: {provider} - {message}")]
    Llm { provider: String, message: String },

    #[error("graph error: {0}")]
    Graph(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unavailable(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    pub fn llm(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Llm {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
