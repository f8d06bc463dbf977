//! Zone-backed provider facade
//!
//! [`ZoneProvider`] implements [`DnsProvider`] for any [`ZoneBackend`] by
//! chaining the reconciliation stages:
//!
//! ```text
//! records()        = list_zones ─► read_records
//! apply_changes()  = list_zones ─► group_by_zone ─► Applier::apply
//! create/update/delete_records() ─► apply_changes()
//! ```
//!
//! The convenience wrappers use the trait's default methods, so every action
//! shares the same planning, dry-run and failure path.

use crate::endpoint::{Changeset, Endpoint};
use crate::error::Result;
use crate::reconcile::{Applier, ApplyReport, group_by_zone, list_zones, read_records};
use crate::traits::{DnsProvider, ZoneBackend};
use crate::zone::ZoneFilter;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A [`DnsProvider`] driving a single [`ZoneBackend`]
#[derive(Debug)]
pub struct ZoneProvider<B> {
    backend: B,
    filter: ZoneFilter,
    dry_run: bool,
    name: &'static str,
}

impl<B: ZoneBackend> ZoneProvider<B> {
    /// Create a provider over `backend`, restricted to zones matching `filter`
    pub fn new(backend: B, filter: ZoneFilter, dry_run: bool) -> Self {
        let name = backend.backend_name();
        if dry_run {
            tracing::warn!("{} provider running in DRY-RUN mode - no changes will be made", name);
        }
        Self {
            backend,
            filter,
            dry_run,
            name,
        }
    }

    /// The wrapped backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl<B: ZoneBackend> DnsProvider for ZoneProvider<B> {
    async fn records(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        let zones = list_zones(&self.backend, &self.filter, cancel).await?;
        let endpoints = read_records(&self.backend, &zones, cancel).await?;

        debug!(
            provider = self.name,
            zones = zones.len(),
            endpoints = endpoints.len(),
            "Read current records"
        );
        Ok(endpoints)
    }

    async fn apply_changes(
        &self,
        cancel: &CancellationToken,
        changes: Changeset,
    ) -> Result<ApplyReport> {
        // return early if there is nothing to change
        if changes.is_empty() {
            return Ok(ApplyReport::default());
        }

        let zones = list_zones(&self.backend, &self.filter, cancel).await?;
        let grouped = group_by_zone(&zones, changes.into_changes())?;

        let report = Applier::new(&self.backend, self.dry_run)
            .apply(&grouped, cancel)
            .await?;

        info!(
            provider = self.name,
            applied = report.applied,
            unchanged = report.unchanged,
            skipped = report.skipped,
            dry_run = self.dry_run,
            "Changeset applied"
        );
        Ok(report)
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}
