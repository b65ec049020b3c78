//! Turn driver: feedback folding and background turns

use crate::history::History;
use crate::runtime::{AgentRuntime, TurnOutput};
use cinegraph_core::{Error, Result, Turn};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::info;

const FEEDBACK_PREFIX: &str = "feedback:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    /// A feedback directive was stored; there is no bot response.
    FeedbackRecorded,
}

/// A turn running on a background task. Exactly one result is delivered.
pub struct PendingTurn {
    input: String,
    rx: oneshot::Receiver<Result<TurnOutput>>,
}

impl PendingTurn {
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// One chat session: the agent plus the history it conditions on.
pub struct Conversation {
    runtime: Arc<AgentRuntime>,
    history: History,
}

impl Conversation {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self::with_history(runtime, History::new())
    }

    pub fn with_history(runtime: Arc<AgentRuntime>, history: History) -> Self {
        Self { runtime, history }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// `feedback: ...` utterances steer later turns instead of asking a question.
    pub fn is_feedback(input: &str) -> bool {
        input
            .trim_start()
            .get(..FEEDBACK_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(FEEDBACK_PREFIX))
    }

    /// Handle one line of user input.
    ///
    /// Feedback is stored verbatim as a user turn. Anything else runs the
    /// agent and, on success, appends the question and the answer.
    pub async fn submit(&mut self, input: &str) -> Result<Reply> {
        if Self::is_feedback(input) {
            self.history.append(Turn::user(input));
            info!("feedback recorded");
            return Ok(Reply::FeedbackRecorded);
        }
        let output = self.runtime.run_turn(input, self.history.turns()).await?;
        Ok(Reply::Answer(self.fold(input, output)))
    }

    /// Store the details of a "was this helpful? no" exchange.
    pub fn record_feedback(&mut self, details: &str) {
        self.history.append(Turn::user(format!("Feedback: {}", details)));
    }

    /// Start a turn on a background task against a snapshot of the history.
    pub fn spawn_turn(&self, input: &str) -> PendingTurn {
        let (tx, rx) = oneshot::channel();
        let runtime = self.runtime.clone();
        let turns = self.history.turns().to_vec();
        let owned = input.to_string();

        tokio::spawn(async move {
            let result = runtime.run_turn(&owned, &turns).await;
            let _ = tx.send(result);
        });

        PendingTurn {
            input: input.to_string(),
            rx,
        }
    }

    /// Wait for a background turn and fold its answer into history.
    pub async fn complete_turn(&mut self, pending: PendingTurn) -> Result<String> {
        let output = pending
            .rx
            .await
            .map_err(|_| Error::Internal("turn worker exited without a result".into()))??;
        Ok(self.fold(&pending.input, output))
    }

    fn fold(&mut self, input: &str, output: TurnOutput) -> String {
        self.history.append(Turn::user(input));
        self.history.append(Turn::agent(output.output.clone()));
        output.output
    }
}
