//! State reader
//!
//! Converts each zone's backend records into [`Endpoint`]s.

use super::cancellable;
use crate::endpoint::{DEFAULT_TTL, Endpoint, RecordType};
use crate::error::{Error, Result};
use crate::traits::{ZoneBackend, ZoneRecord};
use crate::zone::Zone;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Read the current records of every zone
///
/// Records whose type is outside the managed set are skipped: the backend
/// may legitimately hold types zonesync does not manage (SOA, HINFO, ...).
/// A missing TTL becomes [`DEFAULT_TTL`].
///
/// # Errors
///
/// The first zone that cannot be read aborts the whole read with a
/// `ZoneFetch` error; no partial inventory is returned.
pub async fn read_records<B>(
    backend: &B,
    zones: &[Zone],
    cancel: &CancellationToken,
) -> Result<Vec<Endpoint>>
where
    B: ZoneBackend + ?Sized,
{
    let mut endpoints = Vec::new();

    for zone in zones {
        let records = cancellable(cancel, backend.zone_records(zone))
            .await
            .map_err(|e| match e {
                Error::Cancelled => e,
                other => Error::zone_fetch(&zone.name, other),
            })?;

        let before = endpoints.len();
        endpoints.extend(records.iter().filter_map(|record| to_endpoint(zone, record)));
        debug!(
            zone = %zone.name,
            fetched = records.len(),
            managed = endpoints.len() - before,
            "Read zone records"
        );
    }

    Ok(endpoints)
}

fn to_endpoint(zone: &Zone, record: &ZoneRecord) -> Option<Endpoint> {
    let record_type = RecordType::parse(&record.record_type)?;
    let ttl = record.ttl.filter(|ttl| *ttl > 0).unwrap_or(DEFAULT_TTL);

    match Endpoint::new(&record.domain, record_type, record.answers.iter().cloned())
        .and_then(|endpoint| endpoint.with_ttl(ttl))
    {
        Ok(endpoint) => Some(endpoint),
        Err(e) => {
            warn!(zone = %zone.name, record = %record.domain, "Skipping unreadable record: {}", e);
            None
        }
    }
}
