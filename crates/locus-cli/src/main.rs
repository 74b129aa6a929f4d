mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use locus_core::{AppConfig, Domain};
use locus_stream::{
    CachePolicy, Discovery, ReplayOpener, SearchOutcome, SearchRequest, StreamOpener,
};
use tracing_subscriber::EnvFilter;

use crate::render::ConsoleObserver;

#[derive(Debug, Parser)]
#[command(name = "locus-cli")]
#[command(about = "Locus streaming discovery client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a live discovery search against `LOCUS_DISCOVERY_URL`
    Search {
        /// Free-text prompt, e.g. "best seafood near the river"
        query: String,
        /// Search vertical (general, dining, accommodation, activities, itinerary)
        #[arg(long, default_value = "general")]
        domain: Domain,
        /// City to scope the search to
        #[arg(long)]
        city: Option<String>,
        /// Profile to search as (defaults to `LOCUS_PROFILE_ID`)
        #[arg(long)]
        profile_id: Option<String>,
        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Decode a captured stream body offline
    Replay {
        /// File holding the raw `data:` lines of one response
        file: PathBuf,
        #[arg(long, default_value = "general")]
        domain: Domain,
        #[arg(long)]
        city: Option<String>,
        /// Bytes per simulated network read
        #[arg(long, default_value = "4096")]
        chunk_size: usize,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = locus_core::load_app_config();
    let log_level = config
        .as_ref()
        .map_or("info", |c| c.log_level.as_str())
        .to_owned();
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            query,
            domain,
            city,
            profile_id,
            json,
        } => {
            let config = config?;
            let profile_id = resolve_profile_id(profile_id, &config)?;
            let mut discovery = Discovery::from_config(&config)?;
            let request = SearchRequest {
                profile_id,
                domain,
                query,
                location: city,
            };
            run(&mut discovery, request, json).await
        }
        Commands::Replay {
            file,
            domain,
            city,
            chunk_size,
            json,
        } => {
            let body = tokio::fs::read(&file).await.map_err(|e| {
                anyhow::anyhow!("failed to read replay file {}: {e}", file.display())
            })?;
            tracing::info!(file = %file.display(), bytes = body.len(), "replaying captured stream");
            let mut discovery = Discovery::new(
                ReplayOpener::new(body, chunk_size),
                CachePolicy::default(),
                None,
            );
            let request = SearchRequest {
                profile_id: "replay".to_owned(),
                domain,
                query: format!("replay of {}", file.display()),
                location: city,
            };
            run(&mut discovery, request, json).await
        }
    }
}

fn resolve_profile_id(flag: Option<String>, config: &AppConfig) -> anyhow::Result<String> {
    flag.filter(|id| !id.trim().is_empty())
        .or_else(|| config.profile_id.clone())
        .ok_or_else(|| anyhow::anyhow!("no profile id; pass --profile-id or set LOCUS_PROFILE_ID"))
}

/// Runs one search, cancelling it on Ctrl-C, and prints the outcome.
async fn run<O: StreamOpener>(
    discovery: &mut Discovery<O>,
    request: SearchRequest,
    json: bool,
) -> anyhow::Result<()> {
    let controller = discovery.controller();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            controller.cancel();
        }
    });

    let mut observer = ConsoleObserver::new(!json);
    let outcome = discovery.search(request, &mut observer).await;
    watcher.abort();

    let view = match &outcome {
        SearchOutcome::Cancelled => {
            eprintln!("search cancelled");
            return Ok(());
        }
        SearchOutcome::Failed(view) => {
            anyhow::bail!(
                "search failed: {}",
                view.error.as_deref().unwrap_or("unknown error")
            );
        }
        SearchOutcome::Incomplete(view) => {
            eprintln!("stream ended before the search completed; results may be partial");
            view
        }
        SearchOutcome::Completed(view) | SearchOutcome::LoadedFromCache(view) => view,
    };

    let trending = discovery.context().trending.ranked();
    if json {
        let payload = serde_json::json!({
            "city": view.city_name,
            "session_id": view.session_id,
            "from_cache": view.from_cache,
            "results": view.results,
            "trending": trending,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", render::format_results(&view.results));
        if !trending.is_empty() {
            println!();
            print!("{}", render::format_trending(&trending));
        }
    }
    Ok(())
}
