mod app;
mod client;
mod config;
mod error;
mod session;
mod ui;

use std::fs::OpenOptions;

use crate::error::{AppError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(&config)?;

    tracing::info!(base_url = %config.base_url, "starting budget_tui");
    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}

// The terminal is owned by the UI, so logs go to a file.
fn init_tracing(config: &config::AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budget_tui={level},engine={level}",
            level = config.log_level
        ))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))
}
