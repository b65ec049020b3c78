//! In-memory conversation history

use cinegraph_core::{HistoryWindow, Result, Speaker, Turn};
use cinegraph_llm::LlmMessage;

/// Ordered log of turns for one session. Grows only by appending.
#[derive(Clone, Debug, Default)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(speaker, text)` pairs. An unknown speaker is an error.
    pub fn from_pairs<I, S, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: Into<String>,
    {
        let turns = pairs
            .into_iter()
            .map(|(speaker, text)| Turn::parse(speaker.as_ref(), text))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { turns })
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns as prompt messages, in order.
    pub fn format(&self) -> Vec<LlmMessage> {
        format_turns(&self.turns, HistoryWindow::Unbounded)
    }

    pub fn format_window(&self, window: HistoryWindow) -> Vec<LlmMessage> {
        format_turns(&self.turns, window)
    }
}

/// Map turns to `user` / `assistant` messages, preserving order and text.
///
/// A bounded window keeps the last `k` turns but never starts on an agent
/// turn, since a prompt must open with the user.
pub fn format_turns(turns: &[Turn], window: HistoryWindow) -> Vec<LlmMessage> {
    let start = match window {
        HistoryWindow::Unbounded => 0,
        HistoryWindow::LastTurns(k) => {
            let mut start = turns.len().saturating_sub(k);
            while start < turns.len() && turns[start].speaker() == Speaker::Agent {
                start += 1;
            }
            start
        }
    };

    turns[start..]
        .iter()
        .map(|turn| match turn.speaker() {
            Speaker::User => LlmMessage::user(turn.text()),
            Speaker::Agent => LlmMessage::assistant(turn.text()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_skips_leading_agent_turn() {
        let history = History::from_pairs([
            ("user", "q1"),
            ("bot", "a1"),
            ("user", "q2"),
            ("bot", "a2"),
        ])
        .unwrap();
        let messages = history.format_window(HistoryWindow::LastTurns(3));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], LlmMessage::user("q2"));
        assert_eq!(messages[1], LlmMessage::assistant("a2"));
    }

    #[test]
    fn window_larger_than_history_keeps_all() {
        let history = History::from_pairs([("user", "q1"), ("agent", "a1")]).unwrap();
        assert_eq!(history.format_window(HistoryWindow::LastTurns(10)).len(), 2);
    }
}
