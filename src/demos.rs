//! Scripted conversations showing lookup, feedback, history and case handling

use crate::chat::FEEDBACK_HINT;
use cinegraph_agent::{Conversation, Reply};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::error;

pub struct Demo {
    pub name: &'static str,
    pub queries: &'static [&'static str],
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "simple_demo",
        queries: &[
            "Who played in The Matrix?",
            "How many actors are there in the graph?",
            "How many people are both directors and actors of movies?",
            "Tell me more about Sleepless in Seattle",
        ],
    },
    Demo {
        name: "feedback_demo",
        queries: &[
            "Tell me more about Sleepless in Seattle?",
            "feedback: Please refer to me as Mrs. Doubtfire every response",
            "Tell me more about the Polar Express",
        ],
    },
    Demo {
        name: "history_demo",
        queries: &[
            "Who played in the matrix?",
            "What other movies have they been a part of?",
        ],
    },
    Demo {
        name: "case_insensitive_demo",
        queries: &["Who played in The Matrix?", "Who played in the matrix?"],
    },
];

/// Find a demo by name (or `demo1`..`demo4`). Unknown names get the first.
pub fn find(name: &str) -> &'static Demo {
    let by_index = name
        .strip_prefix("demo")
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| DEMOS.get(i));

    by_index
        .or_else(|| DEMOS.iter().find(|d| d.name == name))
        .unwrap_or(&DEMOS[0])
}

pub fn names() -> Vec<&'static str> {
    DEMOS.iter().map(|d| d.name).collect()
}

/// Replay each query through the conversation, printing the answers.
pub async fn run_demo<W>(conversation: &mut Conversation, demo: &Demo, out: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(format!("Running {}\n\n", demo.name).as_bytes()).await?;

    for query in demo.queries {
        out.write_all(format!("query:  {}\n", query).as_bytes()).await?;
        let text = match conversation.submit(query).await {
            Ok(Reply::FeedbackRecorded) => continue,
            Ok(Reply::Answer(answer)) => format!("\nBot: {}\n\n{}\n\n", answer, FEEDBACK_HINT),
            Err(e) => {
                error!(error = %e, query, "demo turn failed");
                format!("\nError: {}\n\n", e)
            }
        };
        out.write_all(text.as_bytes()).await?;
    }
    out.flush().await?;
    Ok(())
}
