//! Azure IPAM command line
//!
//! Operator tool over the reservation allocator:
//! - spaces / reservations: read the IPAM tree
//! - reserve: create by size, explicit CIDR or block pool
//! - show: fetch one reservation, scanning every space when the block is unknown
//! - release: delete a reservation
//!
//! Results are printed as JSON on stdout; logs go to stderr.

mod cli;
mod commands;
mod error;


use clap::Parser;
use ipam_client::{IpamClient, ReservationAllocator};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let cli = Cli::parse();
    let config = cli.config()?;
    debug!("Using IPAM at {} (timeout {:?})", config.api_url, config.timeout);

    let allocator = ReservationAllocator::new(IpamClient::from_config(&config)?);
    let output = commands::run(&allocator, &cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
