//! Cinegraph configuration
//!
//! Tunables live in an optional TOML file; credentials come from the
//! environment. Loaded once at startup, falls back to defaults if no
//! config file exists.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cinegraph.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CinegraphConfig {
    /// Graph database connection.
    pub graph: GraphConfig,
    /// Text-completion model.
    pub llm: LlmConfig,
    /// Agent loop limits and history handling.
    pub agent: AgentSettings,
    /// Entity lookup policy.
    pub lookup: LookupConfig,
    /// Answer generation from query results.
    pub qa: QaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// `http(s)://`, `bolt://` or `neo4j://` URL of the server.
    pub url: Option<String>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Override for the provider endpoint (proxies, local gateways).
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Model calls allowed per turn before giving up.
    pub max_iterations: usize,
    /// Extra attempts when the model answers without consulting the graph.
    pub grounding_retries: usize,
    /// Number of most recent turns sent to the model. 0 keeps everything.
    pub history_window: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Match entity names ignoring letter case.
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Records handed to the answer prompt.
    pub top_k: usize,
}

/// How much conversation history is sent with each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    #[default]
    Unbounded,
    LastTurns(usize),
}

// ============================================================
// Defaults
// ============================================================

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: "neo4j".into(),
            password: None,
            database: "neo4j".into(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 1024,
            api_key: None,
            base_url: None,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            grounding_retries: 2,
            history_window: 0,
        }
    }
}

impl Default for QaConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

impl AgentSettings {
    pub fn window(&self) -> HistoryWindow {
        match self.history_window {
            0 => HistoryWindow::Unbounded,
            k => HistoryWindow::LastTurns(k),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl CinegraphConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Pick the config file: explicit path, then `CINEGRAPH_CONFIG`, then `./cinegraph.toml`.
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var("CINEGRAPH_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Overlay credentials and model selection from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable source. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("NEO4J_URL") {
            self.graph.url = Some(url);
        }
        if let Some(user) = get("NEO4J_USERNAME") {
            self.graph.username = user;
        }
        if let Some(password) = get("NEO4J_PASSWORD") {
            self.graph.password = Some(password);
        }
        if let Some(db) = get("NEO4J_DATABASE") {
            self.graph.database = db;
        }
        if let Some(key) = get("ANTHROPIC_API_KEY").or_else(|| get("API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("CINEGRAPH_MODEL") {
            self.llm.model = model;
        }
    }

    /// Reject configurations that cannot reach both collaborators.
    pub fn validate(&self) -> Result<()> {
        if self.graph.url.is_none() {
            return Err(Error::Config("NEO4J_URL not set".into()));
        }
        if self.llm.api_key.is_none() {
            return Err(Error::Config("ANTHROPIC_API_KEY not set".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(Error::Config("agent.max_iterations must be at least 1".into()));
        }
        Ok(())
    }

    /// Write the current config as TOML. Secrets are never serialized.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
