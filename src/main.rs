use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Once;

use snake_tui::game::GameConfig;
use snake_tui::modes::PlayMode;
use snake_tui::scores::{HighScores, JsonFileStore};

#[derive(Parser)]
#[command(name = "snake_tui")]
#[command(version, about = "Terminal snake with persistent high scores")]
struct Cli {
    /// Side length of the square game grid
    #[arg(long, default_value = "20")]
    grid_size: usize,

    /// Simulation tick cadence in milliseconds
    #[arg(long, default_value = "150")]
    tick_ms: u64,

    /// Directory holding the high score file
    #[arg(long, default_value = ".snake")]
    data_dir: PathBuf,
}

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = GameConfig::new(cli.grid_size);
    config.tick_interval_ms = cli.tick_ms;

    // Load once at startup; rewritten in full on every accepted record
    let scores = HighScores::load(JsonFileStore::new(cli.data_dir));

    let mut mode = PlayMode::new(config, scores);
    mode.run().await?;

    Ok(())
}
