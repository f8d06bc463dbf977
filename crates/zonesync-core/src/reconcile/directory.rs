//! Zone directory
//!
//! Enumerates the backend's zones and keeps the ones the filter accepts.

use super::cancellable;
use crate::error::{Error, Result};
use crate::traits::ZoneBackend;
use crate::zone::{Zone, ZoneFilter};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// List the in-scope zones, sorted by identifier
///
/// The result is a snapshot for the current operation; callers do not cache
/// it across cycles.
///
/// # Errors
///
/// - `ZoneEnumeration` wrapping the backend error if the listing fails
/// - `Cancelled` if the token fires first
pub async fn list_zones<B>(
    backend: &B,
    filter: &ZoneFilter,
    cancel: &CancellationToken,
) -> Result<Vec<Zone>>
where
    B: ZoneBackend + ?Sized,
{
    let all = cancellable(cancel, backend.list_zones())
        .await
        .map_err(|e| match e {
            Error::Cancelled => e,
            other => Error::zone_enumeration(other),
        })?;

    let total = all.len();
    let mut zones: Vec<Zone> = all.into_iter().filter(|z| filter.matches(z)).collect();
    zones.sort_by(|a, b| a.id.cmp(&b.id));

    debug!(
        backend = backend.backend_name(),
        total,
        selected = zones.len(),
        "Listed zones"
    );
    Ok(zones)
}
