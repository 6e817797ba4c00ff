mod app;
mod config;
mod entry;
mod error;
mod ui;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    // Logs go to stderr so the alternate screen stays clean; redirect with
    // `tally 2>tally.log` when debugging.
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally_tui={level},tally_core={level}",
            level = config.log
        ))
        .with_writer(std::io::stderr)
        .init();

    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}
