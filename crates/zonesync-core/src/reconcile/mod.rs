//! Reconciliation pipeline
//!
//! The pieces a provider chains together to read and converge zone state:
//!
//! ```text
//!   list_zones ──► read_records                      (inventory)
//!
//!   list_zones ──► group_by_zone ──► Applier::apply  (changeset)
//!                       │
//!                       └─ build_native_record per change
//! ```
//!
//! Everything here is generic over [`ZoneBackend`](crate::traits::ZoneBackend)
//! and runs on the caller's task. No stage retries; the first error ends the
//! operation.

pub mod applier;
pub mod directory;
pub mod planner;
pub mod reader;

pub use applier::{ApplyReport, Applier};
pub use directory::list_zones;
pub use planner::{ZoneChanges, build_native_record, group_by_zone, zone_for};
pub use reader::read_records;

use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run a backend call unless the token fires first
///
/// Cancellation wins ties so that no call starts after the token fired.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}
