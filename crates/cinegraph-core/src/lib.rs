//! Cinegraph Core - Types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AgentSettings, CinegraphConfig, GraphConfig, HistoryWindow, LlmConfig, LookupConfig, QaConfig,
};
pub use error::{Error, Result};
pub use types::*;
