//! wx-cli - Command line tool for daily weather forecasting experiments.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wx-cli",
    version,
    about = "Daily weather forecast toolkit: ingest, preprocess, backtest"
)]
struct Cli {
    #[command(subcommand)]
    command: wx_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("wx-cli {}", env!("CARGO_PKG_VERSION"));
    wx_cmd::run(cli.command).await
}
