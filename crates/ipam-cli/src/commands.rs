//! Subcommand execution.
//!
//! Each command returns the JSON value `main` prints, so the logic can be
//! driven against any transport.

use ipam_client::{IpamError, IpamTransport, ReservationAllocator};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::cli::{Command, ReleaseArgs, ReservationsArgs, ReserveArgs, ShowArgs, SpacesArgs};
use crate::error::CliError;

/// Run one subcommand
pub async fn run<T: IpamTransport>(
    allocator: &ReservationAllocator<T>,
    command: &Command,
) -> Result<Value, CliError> {
    match command {
        Command::Spaces(args) => spaces(allocator, args).await,
        Command::Reservations(args) => reservations(allocator, args).await,
        Command::Reserve(args) => reserve(allocator, args).await,
        Command::Show(args) => show(allocator, args).await,
        Command::Release(args) => release(allocator, args).await,
    }
}

async fn spaces<T: IpamTransport>(
    allocator: &ReservationAllocator<T>,
    args: &SpacesArgs,
) -> Result<Value, CliError> {
    let spaces = allocator.client().list_spaces(args.expand, args.utilization).await?;
    Ok(serde_json::to_value(spaces)?)
}

async fn reservations<T: IpamTransport>(
    allocator: &ReservationAllocator<T>,
    args: &ReservationsArgs,
) -> Result<Value, CliError> {
    let reservations = allocator
        .client()
        .list_reservations(&args.space, &args.block, args.include_settled)
        .await?;
    Ok(serde_json::to_value(reservations)?)
}

async fn reserve<T: IpamTransport>(
    allocator: &ReservationAllocator<T>,
    args: &ReserveArgs,
) -> Result<Value, CliError> {
    let reservation = allocator.create(&args.to_request()).await?;
    Ok(serde_json::to_value(reservation)?)
}

async fn show<T: IpamTransport>(
    allocator: &ReservationAllocator<T>,
    args: &ShowArgs,
) -> Result<Value, CliError> {
    let reservation = match (&args.space, &args.block) {
        (Some(space), Some(block)) => allocator.get_by_space_block(space, block, &args.id).await?,
        _ => allocator.find_by_id(&args.id).await?,
    };
    Ok(serde_json::to_value(reservation)?)
}

async fn release<T: IpamTransport>(
    allocator: &ReservationAllocator<T>,
    args: &ReleaseArgs,
) -> Result<Value, CliError> {
    let deleted = match allocator.delete(&args.space, &args.block, &args.id).await {
        Ok(()) => true,
        Err(err @ IpamError::DeletionFailed { .. }) if args.ignore_missing => {
            // Only swallow the failure when the block really no longer holds the id.
            match allocator.get_by_space_block(&args.space, &args.block, &args.id).await {
                Err(lookup) if lookup.is_not_found() => {
                    warn!(
                        "Reservation {} already absent from {}/{}",
                        args.id, args.space, args.block
                    );
                    false
                }
                _ => return Err(err.into()),
            }
        }
        Err(err) => return Err(err.into()),
    };

    if deleted {
        info!("Released reservation {}", args.id);
    }
    Ok(json!({
        "id": args.id,
        "space": args.space,
        "block": args.block,
        "deleted": deleted,
    }))
}
