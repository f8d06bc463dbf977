//! Change planner
//!
//! Assigns every change to exactly one zone and builds the backend-shaped
//! record for it. Planning is all-or-nothing: a single unassignable change
//! rejects the whole changeset before anything is sent.

use crate::endpoint::{Change, normalize_name};
use crate::error::{Error, Result};
use crate::traits::ZoneRecord;
use crate::zone::Zone;
use std::collections::BTreeMap;

/// The changes destined for one zone, in orchestrator order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneChanges {
    pub zone: Zone,
    pub changes: Vec<Change>,
}

/// Find the zone owning `dns_name`: the longest zone name that is a suffix
/// on a label boundary
///
/// # Errors
///
/// `Planning` if no zone matches, or if two zones share the longest match
/// (e.g. the same zone name visible under two identifiers).
pub fn zone_for<'a>(zones: &'a [Zone], dns_name: &str) -> Result<&'a Zone> {
    let name = normalize_name(dns_name);
    let mut best: Option<&Zone> = None;
    let mut tied = false;

    for zone in zones.iter().filter(|z| z.contains(&name)) {
        match best {
            Some(current) if zone.name.len() < current.name.len() => {}
            Some(current) if zone.name.len() == current.name.len() => tied = true,
            _ => {
                best = Some(zone);
                tied = false;
            }
        }
    }

    match best {
        None => Err(Error::planning(format!("No zone found for record {}", name))),
        Some(zone) if tied => Err(Error::planning(format!(
            "Record {} matches more than one zone named {}",
            name, zone.name
        ))),
        Some(zone) => Ok(zone),
    }
}

/// Partition changes by owning zone, keyed and iterated by zone identifier
///
/// Relative order of changes is preserved within each zone, so mutations of
/// the same (name, type) pair keep the order the orchestrator gave them.
pub fn group_by_zone(zones: &[Zone], changes: Vec<Change>) -> Result<BTreeMap<String, ZoneChanges>> {
    let mut grouped: BTreeMap<String, ZoneChanges> = BTreeMap::new();

    for change in changes {
        let zone = zone_for(zones, change.endpoint.dns_name())?;
        grouped
            .entry(zone.id.clone())
            .or_insert_with(|| ZoneChanges {
                zone: zone.clone(),
                changes: Vec::new(),
            })
            .changes
            .push(change);
    }

    Ok(grouped)
}

/// Backend-shaped record for a change targeting `zone`
pub fn build_native_record(zone: &Zone, change: &Change) -> ZoneRecord {
    ZoneRecord::from((zone, &change.endpoint))
}
