//! Starliner - Main Entry Point
//!
//! Passenger feature pipeline CLI and prediction service.

use clap::Parser;
use starliner::cli::{cmd_predict, cmd_preprocess, cmd_score, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starliner=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, model } => {
            cmd_serve(&host, port, &model).await?;
        }
        Commands::Preprocess { data, output, config } => {
            cmd_preprocess(&data, &output, config.as_deref())?;
        }
        Commands::Predict { data, output, url, timeout, config } => {
            cmd_predict(&data, &output, &url, timeout, config.as_deref()).await?;
        }
        Commands::Score { data, model, output, config } => {
            cmd_score(&data, &model, &output, config.as_deref())?;
        }
    }

    Ok(())
}
