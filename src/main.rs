use anyhow::Context;
use clap::Parser;

use spreadwatch::adapter::inbound::cli::command::Cli;
use spreadwatch::adapter::inbound::cli::dispatch::dispatch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    dispatch(cli).await.context("spreadwatch exited with an error")
}
