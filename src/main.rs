//! cinegraph: ask questions about movies and the people who make them
//!
//! Usage:
//!   cinegraph                    → interactive chat
//!   cinegraph chat               → interactive chat
//!   cinegraph demo feedback_demo → replay a scripted demo
//!   cinegraph demo --list        → list demos

use cinegraph::chat::{run_chat, ChatOptions};
use cinegraph::{build_runtime, demos};
use cinegraph_agent::Conversation;
use cinegraph_core::CinegraphConfig;
use cinegraph_graph::Neo4jGraph;
use cinegraph_llm::AnthropicProvider;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "cinegraph",
    about = "Movie knowledge-graph chatbot backed by Neo4j",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the bot in the terminal
    Chat,
    /// Replay a scripted demo
    Demo {
        /// Demo name (simple_demo, feedback_demo, history_demo, case_insensitive_demo)
        name: Option<String>,
        /// List available demos and exit
        #[arg(long)]
        list: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    if let Some(Commands::Demo { list: true, .. }) = &cli.command {
        for name in demos::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = CinegraphConfig::load(&CinegraphConfig::resolve_path(cli.config.clone()));
    config.apply_env();
    config.validate()?;

    let graph = Arc::new(Neo4jGraph::connect(&config.graph).await?);
    let api_key = config
        .llm
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("ANTHROPIC_API_KEY not set"))?;
    let mut provider = AnthropicProvider::new(api_key);
    if let Some(url) = &config.llm.base_url {
        provider = provider.with_base_url(url);
    }

    let runtime = build_runtime(graph, Arc::new(provider), &config);
    let mut conversation = Conversation::new(runtime);
    info!(model = %config.llm.model, "cinegraph ready");

    let mut stdout = tokio::io::stdout();
    match cli.command {
        Some(Commands::Demo { name, .. }) => {
            let demo = demos::find(name.as_deref().unwrap_or_default());
            demos::run_demo(&mut conversation, demo, &mut stdout).await?;
        }
        Some(Commands::Chat) | None => {
            let stdin = BufReader::new(tokio::io::stdin());
            run_chat(&mut conversation, stdin, &mut stdout, &ChatOptions::default()).await?;
        }
    }

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cinegraph=info".into());
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("invalid log file path: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}
