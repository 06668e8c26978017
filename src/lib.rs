pub mod advice;
pub mod cli;
pub mod controller;
pub mod db;
pub mod game;
pub mod games;
pub mod metrics;
pub mod pose;
pub mod replay;
pub mod report;
pub mod settings;
mod utils;

use log::error;

use clap::Parser;

use cli::{AppContext, Cli};

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("PhysioPlay starting up...");

    let command = Cli::parse().command;
    let result = (|| -> anyhow::Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async move {
            let ctx = AppContext::open()?;
            cli::execute(command, &ctx).await
        })
    })();

    if let Err(err) = result {
        error!("{err:#}");
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
