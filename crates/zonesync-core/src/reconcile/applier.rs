//! Change applier
//!
//! Issues the per-change backend calls for a planned changeset.
//!
//! ## Failure Semantics
//!
//! - The first failing backend call aborts the *entire* batch, not just the
//!   current zone, and its error is returned wrapped in `Error::Apply`.
//! - Changes applied before the failure stay applied; there is no rollback.
//!   The next reconciliation cycle re-diffs and picks up the remainder.
//! - Cancellation is checked before every mutation and raced against every
//!   in-flight call.
//!
//! ## Idempotent Creates
//!
//! A create rejected with `AlreadyExists` is resolved by re-reading the zone:
//! an identical record already present counts as `unchanged`. Likewise a
//! delete rejected with `NotFound` counts as `unchanged` once a re-read shows
//! the record is gone.

use super::cancellable;
use super::planner::{ZoneChanges, build_native_record};
use crate::endpoint::{Action, Change, DEFAULT_TTL, normalize_name};
use crate::error::{Error, Result};
use crate::traits::{ZoneBackend, ZoneRecord};
use crate::zone::Zone;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outcome of a successful apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Mutations the backend accepted
    pub applied: usize,
    /// Creates for records already present with identical content, and
    /// deletes for records already absent
    pub unchanged: usize,
    /// Changes logged but not sent (dry-run)
    pub skipped: usize,
}

impl ApplyReport {
    /// Number of changes processed
    pub fn total(&self) -> usize {
        self.applied + self.unchanged + self.skipped
    }
}

/// Applies planned changes through a [`ZoneBackend`]
pub struct Applier<'a, B: ?Sized> {
    backend: &'a B,
    dry_run: bool,
}

impl<'a, B> Applier<'a, B>
where
    B: ZoneBackend + ?Sized,
{
    pub fn new(backend: &'a B, dry_run: bool) -> Self {
        Self { backend, dry_run }
    }

    /// Apply grouped changes, zone by zone in key order
    ///
    /// # Returns
    ///
    /// - `Ok(ApplyReport)`: every change was applied, resolved, or skipped
    /// - `Err(Error::Apply)`: a backend call failed; later changes were not attempted
    /// - `Err(Error::Cancelled)`: the token fired; later changes were not attempted
    pub async fn apply(
        &self,
        grouped: &BTreeMap<String, ZoneChanges>,
        cancel: &CancellationToken,
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        for batch in grouped.values() {
            for change in &batch.changes {
                if cancel.is_cancelled() {
                    info!(
                        zone = %batch.zone.name,
                        applied = report.applied,
                        "Apply cancelled, remaining changes not sent"
                    );
                    return Err(Error::Cancelled);
                }

                let record = build_native_record(&batch.zone, change);
                info!(
                    record = %record.domain,
                    r#type = %record.record_type,
                    ttl = record.ttl.unwrap_or(DEFAULT_TTL),
                    action = %change.action,
                    zone = %batch.zone.name,
                    dry_run = self.dry_run,
                    "Changing record"
                );

                if self.dry_run {
                    report.skipped += 1;
                    continue;
                }

                match self.dispatch(&batch.zone, change, &record, cancel).await {
                    Ok(true) => report.applied += 1,
                    Ok(false) => report.unchanged += 1,
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => {
                        return Err(Error::apply(
                            change.action.as_str(),
                            &record.domain,
                            &batch.zone.name,
                            e,
                        ));
                    }
                }
            }
        }

        Ok(report)
    }

    /// Send one change; `Ok(false)` means the backend already matched it
    async fn dispatch(
        &self,
        zone: &Zone,
        change: &Change,
        record: &ZoneRecord,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        match change.action {
            Action::Create => {
                match cancellable(cancel, self.backend.create_record(record)).await {
                    Ok(()) => Ok(true),
                    Err(Error::AlreadyExists(reason)) => {
                        self.resolve_existing(zone, record, reason, cancel).await
                    }
                    Err(e) => Err(e),
                }
            }
            Action::Update => cancellable(cancel, self.backend.update_record(record))
                .await
                .map(|()| true),
            Action::Delete => {
                match cancellable(
                    cancel,
                    self.backend
                        .delete_record(zone, &record.domain, &record.record_type),
                )
                .await
                {
                    Ok(()) => Ok(true),
                    Err(Error::NotFound(reason)) => {
                        self.resolve_missing(zone, record, reason, cancel).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// A delete that found nothing is done if the zone no longer holds the record
    async fn resolve_missing(
        &self,
        zone: &Zone,
        record: &ZoneRecord,
        reason: String,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let existing = cancellable(cancel, self.backend.zone_records(zone)).await?;

        let still_present = existing.iter().any(|current| {
            normalize_name(&current.domain) == normalize_name(&record.domain)
                && current.record_type.eq_ignore_ascii_case(&record.record_type)
        });
        if still_present {
            return Err(Error::NotFound(reason));
        }

        debug!(
            record = %record.domain,
            r#type = %record.record_type,
            zone = %zone.name,
            "Record already absent"
        );
        Ok(false)
    }

    async fn resolve_existing(
        &self,
        zone: &Zone,
        record: &ZoneRecord,
        reason: String,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let existing = cancellable(cancel, self.backend.zone_records(zone)).await?;

        if existing
            .iter()
            .any(|current| current.same_content(record, DEFAULT_TTL))
        {
            debug!(
                record = %record.domain,
                r#type = %record.record_type,
                zone = %zone.name,
                "Record already present with identical content"
            );
            Ok(false)
        } else {
            Err(Error::AlreadyExists(reason))
        }
    }
}
