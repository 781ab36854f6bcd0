//! CLI entry point for the job-market graph loader.
//!
//! Loads the configured CSV sources into Neo4j and prints a JSON report of
//! every phase plus the resulting graph counts to stdout.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use jobgraph_core::config::{Neo4jSettings, Settings};
use jobgraph_graph::{GraphClient, GraphConfig};

use jobgraph_load::{
    GraphLoader, GraphStore, GraphSummary, LoadError, LoadReport, MemoryGraph, Neo4jStore,
    RetryPolicy, StoreError,
};

#[derive(Parser)]
#[command(name = "jobgraph-load")]
#[command(about = "Load job-market CSV records into the Neo4j graph")]
struct Cli {
    /// Config file prefix (default: jobgraph).
    #[arg(short, long, default_value = "jobgraph")]
    config: String,

    /// Load into an in-memory graph instead of Neo4j.
    #[arg(long)]
    dry_run: bool,

    /// Override the number of rows per bulk statement.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Make a single attempt instead of retrying while Neo4j is unreachable.
    #[arg(long)]
    no_retry: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;
    if let Some(batch_size) = cli.batch_size {
        settings.load.batch_size = batch_size;
    }

    let policy = if cli.no_retry {
        RetryPolicy::once()
    } else {
        RetryPolicy::from(&settings.load)
    };

    let (report, graph) = if cli.dry_run {
        tracing::info!("Dry run: loading into an in-memory graph");
        let loader = GraphLoader::new(MemoryGraph::new(), settings.sources.clone())
            .with_batch_size(settings.load.batch_size);
        let report = loader.run().await?;
        let graph = loader.store().summary().await?;
        (report, graph)
    } else {
        load_neo4j(&settings, &policy).await?
    };

    let output = serde_json::json!({ "report": report, "graph": graph });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Connect and load, starting over from a fresh connection while Neo4j is
/// unreachable.
async fn load_neo4j(
    settings: &Settings,
    policy: &RetryPolicy,
) -> Result<(LoadReport, GraphSummary), LoadError> {
    let graph_config = graph_config(&settings.neo4j);
    let graph_config = &graph_config;

    jobgraph_load::retry::with_retries(policy, move |attempt| async move {
        tracing::info!(attempt, uri = %graph_config.uri, "Starting graph load");
        let client = GraphClient::connect(graph_config)
            .await
            .map_err(StoreError::from)?;
        client.ping().await.map_err(StoreError::from)?;

        let loader = GraphLoader::new(Neo4jStore::new(client), settings.sources.clone())
            .with_batch_size(settings.load.batch_size);
        let report = loader.run().await?;
        let graph = loader.store().summary().await?;
        Ok((report, graph))
    })
    .await
}

fn graph_config(neo4j: &Neo4jSettings) -> GraphConfig {
    GraphConfig {
        uri: neo4j.uri.clone(),
        user: neo4j.user.clone(),
        password: neo4j.password.clone(),
        database: neo4j.database.clone(),
        ..Default::default()
    }
}
