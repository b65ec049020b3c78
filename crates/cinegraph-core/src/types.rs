//! Conversation types shared by every layer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    #[serde(alias = "bot")]
    Agent,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Speaker {
    type Err = Error;

    /// `bot` is accepted as a synonym for `agent`; anything else is a caller error.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Speaker::User),
            "agent" | "bot" => Ok(Speaker::Agent),
            other => Err(Error::MalformedHistory(format!(
                "unknown speaker '{}' (expected user or agent)",
                other
            ))),
        }
    }
}

/// One utterance in a conversation. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Speaker::Agent, text)
    }

    /// Build a turn from a raw `(speaker, text)` pair.
    pub fn parse(speaker: &str, text: impl Into<String>) -> Result<Self> {
        Ok(Self::new(speaker.parse()?, text))
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Fallback answer when the resolution path produces nothing usable.
pub const UNKNOWN_ANSWER: &str = "I don't know the answer";

/// Fallback answer when the agent cannot ground a reply in a database call.
pub const NOT_IN_DATABASE: &str =
    "I don't know because this information isn't there in the database";
