//! Rember command-line front end
//!
//! Talks to the SQLite document store and an S3-compatible blob store
//! configured through the environment (a `.env` file is honoured).

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rember=info")),
        )
        .init();

    let cli = Cli::parse();
    info!(version = rember::version(), "starting rember");

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
