//! Zone backend trait
//!
//! [`ZoneBackend`] is the narrow seam between the generic reconciliation code
//! and a concrete DNS management API. It speaks in [`ZoneRecord`]s, the
//! backend-shaped view of a record (domain, type, TTL, answer list).

use crate::endpoint::{Endpoint, normalize_name};
use crate::zone::Zone;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A record in the shape backend create/update/delete calls take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Zone the record lives in
    pub zone: String,
    /// Fully-qualified record name
    pub domain: String,
    /// Record type as the backend spells it
    pub record_type: String,
    /// TTL in seconds, if the backend reports one
    pub ttl: Option<u32>,
    /// Record answers (targets)
    pub answers: Vec<String>,
}

impl ZoneRecord {
    /// Whether two records carry the same content
    ///
    /// `default_ttl` stands in for a missing TTL on either side; answer order
    /// is ignored.
    pub fn same_content(&self, other: &ZoneRecord, default_ttl: u32) -> bool {
        normalize_name(&self.domain) == normalize_name(&other.domain)
            && self.record_type.eq_ignore_ascii_case(&other.record_type)
            && self.ttl.unwrap_or(default_ttl) == other.ttl.unwrap_or(default_ttl)
            && self.answers.iter().collect::<BTreeSet<_>>()
                == other.answers.iter().collect::<BTreeSet<_>>()
    }
}

impl From<(&Zone, &Endpoint)> for ZoneRecord {
    fn from((zone, endpoint): (&Zone, &Endpoint)) -> Self {
        Self {
            zone: zone.name.clone(),
            domain: endpoint.dns_name().to_string(),
            record_type: endpoint.record_type().as_str().to_string(),
            ttl: Some(endpoint.effective_ttl()),
            answers: endpoint.targets().to_vec(),
        }
    }
}

/// Trait for DNS management backends
///
/// Implementations perform exactly one remote call per method and do not
/// retry; cancellation and failure policy belong to the caller.
///
/// Errors should use the most specific [`crate::Error`] variant available:
/// in particular `AlreadyExists` when a create collides with an existing
/// record, which the applier resolves for idempotent creates.
#[async_trait]
pub trait ZoneBackend: Send + Sync {
    /// List every zone visible to this backend
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// Fetch all records of one zone
    async fn zone_records(&self, zone: &Zone) -> Result<Vec<ZoneRecord>, crate::Error>;

    /// Create a record
    async fn create_record(&self, record: &ZoneRecord) -> Result<(), crate::Error>;

    /// Replace an existing record's TTL and answers
    async fn update_record(&self, record: &ZoneRecord) -> Result<(), crate::Error>;

    /// Delete the record identified by zone, domain and type
    async fn delete_record(
        &self,
        zone: &Zone,
        domain: &str,
        record_type: &str,
    ) -> Result<(), crate::Error>;

    /// Backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}
