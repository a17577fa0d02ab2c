//! Podtrack CLI Application
//!
//! Command-line interface for tracking proof-of-delivery progression.

mod args;
mod cli;
mod renderer;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use podtrack_core::{
    HttpAuthority, LocalAuthority, PodAuthority, StatusPolicy, TrackerBuilder, TrackerConfig,
};
use renderer::TerminalRenderer;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        storage_dir,
        api_url,
        token,
        timeout_secs,
        lenient_status,
        no_color,
        command,
    } = Args::parse();

    let request_timeout = Duration::from_secs(timeout_secs);

    let (authority, local): (Arc<dyn PodAuthority>, Option<LocalAuthority>) = match api_url {
        Some(url) => {
            info!("Using POD API at {url}");
            let http = HttpAuthority::builder(url)
                .with_timeout(request_timeout)
                .with_token(token)
                .build()
                .context("Failed to configure API client")?;
            (Arc::new(http), None)
        }
        None => {
            let local = LocalAuthority::builder()
                .with_database_path(database_file)
                .with_storage_dir(storage_dir)
                .build()
                .await
                .context("Failed to initialize local POD store")?;
            (Arc::new(local.clone()), Some(local))
        }
    };

    let config = TrackerConfig {
        request_timeout,
        status_policy: if lenient_status {
            StatusPolicy::Lenient
        } else {
            StatusPolicy::Strict
        },
        ..TrackerConfig::default()
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let builder = TrackerBuilder::new(authority)
        .with_config(config)
        .with_events(events_tx);

    let renderer = TerminalRenderer::new(!no_color);

    info!("Podtrack started");

    Cli::new(builder, events_rx, local, renderer)
        .handle_command(command.unwrap_or(Commands::Steps))
        .await
}
