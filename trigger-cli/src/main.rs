//! lore CLI: inject world-book lore or role memories for one message. Config from env and CLI args.

use anyhow::Result;
use clap::Parser;
use trigger_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    trigger::logger::init_tracing(cli.log_file.as_deref())?;

    run(cli).await
}
