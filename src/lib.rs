pub mod cli;
pub mod columns;
pub mod compare;
pub mod data;
pub mod diagnose;
pub mod export;
pub mod io_utils;
pub mod load;
pub mod matcher;
pub mod normalize;
pub mod preview;
pub mod reconcile;
pub mod report;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabrecon", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => compare::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}
