use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rag_cache::{cache_key, CacheTiers, TiersConfig};
use rag_pipeline::{
    ExtractiveAnswerer, HashingEmbedder, InMemorySearch, RagPipeline, SearchMode, SearchOptions,
};

#[derive(Parser)]
#[command(name = "rag-pipeline")]
#[command(about = "Tiered caching for RAG pipelines", long_about = None)]
struct Cli {
    /// Env file with RAG_CACHE_* overrides (default: ./.env if present)
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved tier configuration as JSON
    Config,

    /// Derive a cache key from a prefix and name=value parameters
    Key {
        /// Namespace prefix (embedding, query, rag, ...)
        prefix: String,

        /// Parameters as name=value
        params: Vec<String>,
    },

    /// Answer a question over the built-in sample corpus
    Ask {
        /// The question
        question: String,

        /// Maximum number of context chunks
        #[arg(short, long, default_value_t = 3)]
        limit: usize,

        /// Search mode: hybrid, vector or keyword
        #[arg(short, long, default_value = "hybrid")]
        mode: String,

        /// Ask the same question this many times
        #[arg(short, long, default_value_t = 2)]
        repeat: usize,
    },
}

const SAMPLE_CORPUS: &[(&str, &str)] = &[
    (
        "tiers",
        "The embedding tier keeps 500 vectors for one hour because embeddings are stable for a given text.",
    ),
    (
        "query",
        "The query tier keeps 200 result lists for five minutes since search results go stale as the knowledge base changes.",
    ),
    (
        "answers",
        "The answer tier keeps 100 synthesised answers for ten minutes.",
    ),
    (
        "eviction",
        "When a tier is full the oldest inserted entry is evicted first; reads do not refresh its position.",
    ),
    (
        "expiry",
        "Expired entries are removed lazily when they are read.",
    ),
];

fn load_config(cli: &Cli) -> Result<TiersConfig> {
    let config = match &cli.env_file {
        Some(path) => TiersConfig::from_env_file(path)?,
        None => TiersConfig::from_env()?,
    };
    Ok(config)
}

fn parse_mode(mode: &str) -> Result<SearchMode> {
    match mode {
        "hybrid" => Ok(SearchMode::Hybrid),
        "vector" => Ok(SearchMode::VectorOnly),
        "keyword" => Ok(SearchMode::KeywordOnly),
        other => bail!("Unknown search mode '{}' (expected hybrid, vector or keyword)", other),
    }
}

fn sample_pipeline(
    tiers: &CacheTiers,
) -> RagPipeline<HashingEmbedder, InMemorySearch, ExtractiveAnswerer> {
    let embedder = HashingEmbedder::new(256);
    let mut search = InMemorySearch::new();
    for (id, text) in SAMPLE_CORPUS {
        search.index(*id, *text, json!({ "source": "sample" }), embedder.embed_sync(text));
    }
    RagPipeline::new(tiers, embedder, search, ExtractiveAnswerer::new(2))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rag_pipeline=info,rag_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config => {
            let config = load_config(&cli)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Key {
            ref prefix,
            ref params,
        } => {
            let mut pairs = Vec::with_capacity(params.len());
            for param in params {
                match param.split_once('=') {
                    Some((name, value)) => pairs.push((name.to_string(), value.to_string())),
                    None => bail!("Parameter '{}' is not in name=value form", param),
                }
            }
            println!("{}", cache_key(prefix, pairs));
        }

        Commands::Ask {
            ref question,
            limit,
            ref mode,
            repeat,
        } => {
            let config = load_config(&cli)?;
            let tiers = CacheTiers::new(&config)?;
            let pipeline = sample_pipeline(&tiers);
            let options = SearchOptions::new()
                .with_limit(limit)
                .with_mode(parse_mode(mode)?);

            for round in 1..=repeat.max(1) {
                let answer = pipeline.ask(question, &options).await?;
                println!("[{}] {}", round, answer.answer);
                for source in &answer.sources {
                    println!("    - {} ({:.3})", source.id, source.final_score);
                }
            }

            println!();
            println!(
                "Provider calls: embed={}, search={}, answer={}",
                pipeline.embedder().provider().calls(),
                pipeline.search().provider().calls(),
                pipeline.answerer().calls()
            );
            for tier in tiers.stats() {
                println!("{:<10} {}/{}  {}", tier.tier, tier.stats.entries, tier.max_size, tier.stats);
            }
        }
    }

    Ok(())
}
