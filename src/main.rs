// src/main.rs

mod chat;
mod cli;
mod config;
mod error;
mod llm;
mod prompt;
mod transcript;

use clap::Parser;
use reqwest::Client;
use tracing::{error, info};

#[tokio::main]
async fn main() -> error::Result<()> {
    // Load .env before reading OPENAI_API_KEY
    dotenvy::dotenv().ok(); // Ignore error if .env is not found

    #[cfg(feature = "logging")]
    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    let args = cli::args::Args::parse();

    info!("Starting ai chat CLI...");

    let config = match config::Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Startup failed: {:?}", e);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    let client = Client::new();

    cli::repl::run_interactive(&config, &client).await
}
