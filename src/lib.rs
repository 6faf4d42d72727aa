//! Binaural beat generator.
//!
//! [`domain`] validates carrier pairs, [`engine`] plays them through an
//! [`audio`] output with click-free ramps, and [`app`] wires the two to
//! session storage in [`db`].

pub mod app;
pub mod audio;
mod cli;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod settings;
mod utils;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;

pub use engine::{EngineState, PlaybackEngine};
pub use error::{Result, SimbeatError};

pub fn run() -> anyhow::Result<()> {
    let default_level = match std::env::var("SIMBEAT_DEBUG") {
        Ok(value) if value == "1" => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let cli = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    log::debug!("simbeat starting up");
    runtime.block_on(cli::dispatch(cli))
}
