//! Command line structure.

use clap::{Args, Parser, Subcommand};
use ipam_client::config::{ENV_API_URL, ENV_SKIP_CERT_VERIFICATION, ENV_TIMEOUT_SECS, ENV_TOKEN};
use ipam_client::{AllocationRequest, IpamConfig};
use std::time::Duration;

use crate::error::CliError;

/// Reserve, inspect and release address space in Azure IPAM.
#[derive(Debug, Parser)]
#[command(name = "azureipam")]
#[command(version, about = "Manage Azure IPAM reservations", long_about = None)]
pub struct Cli {
    /// IPAM API root (without the /api suffix)
    #[arg(long, value_name = "URL", global = true, env = ENV_API_URL)]
    pub api_url: Option<String>,

    /// Bearer token for the IPAM API
    #[arg(long, value_name = "TOKEN", global = true, env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true, env = ENV_SKIP_CERT_VERIFICATION)]
    pub skip_cert_verification: bool,

    /// Per-request timeout (in seconds)
    #[arg(
        long,
        value_name = "SECONDS",
        global = true,
        env = ENV_TIMEOUT_SECS,
        default_value_t = 10
    )]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List address spaces and their blocks
    Spaces(SpacesArgs),

    /// List reservations in a block
    Reservations(ReservationsArgs),

    /// Create a reservation
    Reserve(ReserveArgs),

    /// Show one reservation
    Show(ShowArgs),

    /// Delete a reservation
    Release(ReleaseArgs),
}

/// Options for `spaces`.
#[derive(Debug, Args)]
pub struct SpacesArgs {
    /// Include vnets and externals
    #[arg(long)]
    pub expand: bool,

    /// Include size/used figures
    #[arg(long)]
    pub utilization: bool,
}

/// Options for `reservations`.
#[derive(Debug, Args)]
pub struct ReservationsArgs {
    /// Space name
    #[arg(long)]
    pub space: String,

    /// Block name
    #[arg(long)]
    pub block: String,

    /// Also list settled and cancelled reservations
    #[arg(long)]
    pub include_settled: bool,
}

/// Options for `reserve`.
#[derive(Debug, Args)]
pub struct ReserveArgs {
    /// Space name
    #[arg(long)]
    pub space: String,

    /// Block name; repeat to reserve from a pool of blocks
    #[arg(long = "block", required = true)]
    pub blocks: Vec<String>,

    /// Prefix length to reserve
    #[arg(long, conflicts_with = "cidr", required_unless_present = "cidr")]
    pub size: Option<u8>,

    /// Exact CIDR to reserve
    #[arg(long)]
    pub cidr: Option<String>,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// Search from the end of the block
    #[arg(long)]
    pub reverse_search: bool,

    /// Prefer the smallest free range that fits
    #[arg(long)]
    pub smallest_cidr: bool,
}

/// Options for `show`.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Reservation id
    #[arg(long)]
    pub id: String,

    /// Space name; with --block skips the full scan
    #[arg(long, requires = "block")]
    pub space: Option<String>,

    /// Block name
    #[arg(long, requires = "space")]
    pub block: Option<String>,
}

/// Options for `release`.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Space name
    #[arg(long)]
    pub space: String,

    /// Block name
    #[arg(long)]
    pub block: String,

    /// Reservation id
    #[arg(long)]
    pub id: String,

    /// Succeed when the reservation is already gone
    #[arg(long)]
    pub ignore_missing: bool,
}

impl Cli {
    /// Build the client configuration from flags and environment
    ///
    /// # Errors
    /// Returns `CliError::InvalidConfig` when the URL or token is missing,
    /// or the library's validation error otherwise.
    pub fn config(&self) -> Result<IpamConfig, CliError> {
        let api_url = self
            .api_url
            .clone()
            .ok_or_else(|| {
                CliError::InvalidConfig(format!("--api-url or {ENV_API_URL} is required"))
            })?;
        let token = self
            .token
            .clone()
            .ok_or_else(|| CliError::InvalidConfig(format!("--token or {ENV_TOKEN} is required")))?;

        let mut config = IpamConfig::new(api_url, token);
        config.skip_cert_verification = self.skip_cert_verification;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.validate()?;
        Ok(config)
    }
}

impl ReserveArgs {
    /// Turn the flags into an allocation request
    ///
    /// Shape checks happen later in `AllocationRequest::plan`.
    pub fn to_request(&self) -> AllocationRequest {
        AllocationRequest {
            space: self.space.clone(),
            blocks: self.blocks.clone(),
            description: self.description.clone(),
            size: self.size,
            specific_cidr: self.cidr.clone(),
            reverse_search: self.reverse_search,
            smallest_cidr: self.smallest_cidr,
        }
    }
}
