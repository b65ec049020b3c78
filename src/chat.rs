//! Interactive chat loop

use cinegraph_agent::Conversation;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

pub const BANNER: &str = "\
****

Welcome to the Movie Chatbot! I can provide information about movies and actors from my database.
Feel free to ask me questions such as, 'Who starred in Sleepless in Seattle?'

****

";

pub const FEEDBACK_HINT: &str = "To provide feedback, enter \"feedback\"";

const FEEDBACK_THANKS: &str = "Thank you for your feedback! We will try to improve.";

pub struct ChatOptions {
    /// Interval between liveness dots while a turn runs.
    pub tick: Duration,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

/// Read-eval loop until `quit`, `exit` or end of input.
pub async fn run_chat<R, W>(
    conversation: &mut Conversation,
    input: R,
    out: &mut W,
    options: &ChatOptions,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    say(out, BANNER).await?;

    loop {
        say(out, "You: ").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("feedback") {
            say(out, "Was the response helpful? (yes/no): ").await?;
            let answer = lines.next_line().await?.unwrap_or_default();
            match answer.trim().to_lowercase().as_str() {
                "no" => {
                    say(out, "What was wrong with the response? ").await?;
                    let details = lines.next_line().await?.unwrap_or_default();
                    conversation.record_feedback(details.trim());
                    say(out, &format!("{}\n", FEEDBACK_THANKS)).await?;
                }
                "yes" => say(out, "Glad to hear that!\n").await?,
                _ => {}
            }
            continue;
        }

        if Conversation::is_feedback(line) {
            conversation.submit(line).await?;
            say(out, &format!("{}\n", FEEDBACK_THANKS)).await?;
            continue;
        }

        let pending = conversation.spawn_turn(line);
        let turn = conversation.complete_turn(pending);
        tokio::pin!(turn);
        // first dot only after a full tick
        let start = tokio::time::Instant::now() + options.tick;
        let mut ticker = tokio::time::interval_at(start, options.tick);

        let result = loop {
            tokio::select! {
                result = &mut turn => break result,
                _ = ticker.tick() => say(out, ".").await?,
            }
        };

        match result {
            Ok(answer) => {
                say(out, &format!("\nBot: {}\n\n{}\n\n", answer, FEEDBACK_HINT)).await?;
            }
            Err(e) => {
                error!(error = %e, "turn failed");
                say(out, &format!("\nError: {}\n\n", e)).await?;
            }
        }
    }

    Ok(())
}
