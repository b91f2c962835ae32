//! # ecosort_app
//!
//! Headless EcoSort: rubbish rides a conveyor belt and pushers shove each
//! item into the collector for its kind.
//!
//! ## Startup Sequence
//!
//! 1. Read [`FrameConfig`](config::FrameConfig) from `ECOSORT_*` environment
//!    variables.
//! 2. Build the menu and game scenes.
//! 3. Enter the fixed-timestep frame loop, starting in the menu.

mod components;
mod config;
mod context;
mod frame;
mod levels;
mod scene;
mod systems;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::FrameConfig;
use frame::FrameLoop;

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ecosort_app=info".parse()?))
        .init();

    info!("ecosort starting");

    let config = FrameConfig::from_env().context("loading frame configuration")?;
    let context = levels::build_context();

    let mut frame_loop = FrameLoop::new(config, context);
    frame_loop.run().context("frame loop aborted")?;

    info!("ecosort shut down");
    Ok(())
}
