use anyhow::Result;
use clap::Parser;
use ragdoc_rag::AppConfig;
use tracing::warn;

mod cli;
mod commands;
mod render;

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    for variable in config.missing_credentials() {
        warn!(variable, "credential not set, calls to that service will fail");
    }
    if let Some(index) = cli.index {
        config.index.name = index;
    }
    if let Commands::Ask { top_k: Some(top_k), .. } = &cli.command {
        config.rag.top_k = *top_k;
    }

    let pipeline = commands::build_pipeline(&config)?;
    let output = match &cli.command {
        Commands::Ingest { paths } => commands::ingest(&pipeline, paths).await?,
        Commands::Ask { question, show_context, .. } => {
            commands::ask(&pipeline, &question.join(" "), *show_context).await?
        }
        Commands::Stats => commands::stats(&pipeline).await?,
    };
    println!("{output}");

    Ok(())
}
