//! Application entry point
//!
//! Loads configuration, installs logging, opens the database and runs one
//! command.

use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use snaplink::cli::{dispatch, Cli};
use snaplink::command::AppState;
use snaplink::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(database) = cli.database.clone() {
        config.database_url = database;
    }

    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(database = %config.database_url, "opening database");
    let state = match AppState::open(&config) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match dispatch(&state, cli.command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
