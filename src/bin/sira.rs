//! CLI binary for sira.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use sira::research::JsonVectorStore;
use sira::{ResearchPipeline, SiraConfig};
use sira_retrieval::{CancellationToken, OfflineCache, Retriever, SearchResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// SIRA: adaptive multi-provider research retrieval.
#[derive(Parser)]
#[command(name = "sira", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Retrieve search results for a topic.
    Retrieve {
        /// Research topic.
        topic: String,
    },

    /// Show the configured providers and their state.
    Providers,

    /// Query the offline cache without touching the network.
    Cache {
        /// Topic substring to match against cached entries.
        topic: String,
    },

    /// Retrieve, score, summarise and graph a topic.
    Research {
        /// Research topic.
        topic: String,
    },

    /// Store a text in a user's semantic memory.
    Remember {
        /// Owner of the memory.
        user: String,
        /// Text to remember.
        text: String,
        /// Source URL.
        #[arg(long, default_value = "")]
        url: String,
        /// Source title.
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Find a user's memories closest to a query.
    Recall {
        /// Owner of the memories.
        user: String,
        /// Free-text query.
        query: String,
        /// Maximum number of matches.
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(SiraConfig::default_config_path);
    let config = SiraConfig::load_or_default(&config_path)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    info!(config = %config_path.display(), "sira v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Retrieve { topic } => run_retrieve(&config, &topic).await,
        Command::Providers => list_providers(&config),
        Command::Cache { topic } => query_cache(&config, &topic).await,
        Command::Research { topic } => run_research(&config, &topic).await,
        Command::Remember {
            user,
            text,
            url,
            title,
        } => {
            let id = memory_pipeline(&config)?
                .remember(&user, &text, &url, &title)
                .await?;
            print_json(&serde_json::json!({ "id": id }))
        }
        Command::Recall { user, query, top_k } => {
            let matches = memory_pipeline(&config)?.recall(&user, &query, top_k).await?;
            print_json(&matches)
        }
    }
}

async fn run_retrieve(config: &SiraConfig, topic: &str) -> anyhow::Result<()> {
    let retriever = Retriever::new(config.resolved_retrieval()?)?;
    let cancel = cancel_on_ctrl_c();
    let results: Vec<SearchResult> = retriever.retrieve_cancellable(topic, &cancel).await?;
    print_json(&results)
}

fn list_providers(config: &SiraConfig) -> anyhow::Result<()> {
    let retriever = Retriever::new(config.resolved_retrieval()?)?;
    print_json(&retriever.registry().all())
}

async fn query_cache(config: &SiraConfig, topic: &str) -> anyhow::Result<()> {
    let retrieval = config.resolved_retrieval()?;
    let cache = OfflineCache::new(retrieval.cache_path);
    print_json(&cache.query_by_topic_substring(topic).await)
}

async fn run_research(config: &SiraConfig, topic: &str) -> anyhow::Result<()> {
    let retriever = Arc::new(Retriever::new(config.resolved_retrieval()?)?);
    let report = ResearchPipeline::new(retriever).run(topic).await?;
    print_json(&report)
}

/// Pipeline whose memory is the JSON store at the configured memory path.
fn memory_pipeline(config: &SiraConfig) -> anyhow::Result<ResearchPipeline> {
    let retriever = Arc::new(Retriever::new(config.resolved_retrieval()?)?);
    let store = JsonVectorStore::new(config.resolved_memory_path());
    info!(path = %store.path().display(), "using memory store");
    Ok(ResearchPipeline::new(retriever).with_vector_store(Arc::new(store)))
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            guard.cancel();
        }
    });
    cancel
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
