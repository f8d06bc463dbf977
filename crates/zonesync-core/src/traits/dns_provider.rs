// # DNS Provider Trait
//
// The capability surface the orchestrator consumes. Every backend adapter
// implements the same operations; the orchestrator never knows which backend
// it is talking to.
//
// ## Implementations
//
// - Generic zone-backed provider: [`crate::ZoneProvider`]
// - BlueCat Address Manager: `zonesync-provider-bluecat` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::{DnsProvider, Endpoint, RecordType};
// use tokio_util::sync::CancellationToken;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//     let cancel = CancellationToken::new();
//
//     provider.create_records(&cancel, vec![
//         Endpoint::new("x.example.com", RecordType::A, ["1.2.3.4"])?,
//     ]).await?;
//
//     for endpoint in provider.records(&cancel).await? {
//         println!("{}", endpoint);
//     }
//     Ok(())
// }
// ```

use crate::endpoint::{Action, Changeset, Endpoint};
use crate::reconcile::ApplyReport;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Cancellation
///
/// Every method takes the caller's [`CancellationToken`]. Once it fires, no
/// new backend call is started and the method returns
/// [`Error::Cancelled`](crate::Error::Cancelled). Mutations that already went
/// out stay applied.
///
/// # Failure Model
///
/// Providers do not retry. The first failing backend call ends the operation
/// and its error is returned; the orchestrator re-diffs on its next cycle.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every managed record in the in-scope zones
    ///
    /// A failure reading any single zone fails the whole call; a partial
    /// inventory is never returned.
    async fn records(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>, crate::Error>;

    /// Apply an ordered changeset
    ///
    /// Every change is assigned to a zone before the first mutation is sent.
    /// In dry-run mode the changes are planned and logged but never sent.
    async fn apply_changes(
        &self,
        cancel: &CancellationToken,
        changes: Changeset,
    ) -> Result<ApplyReport, crate::Error>;

    /// Create the given records
    async fn create_records(
        &self,
        cancel: &CancellationToken,
        endpoints: Vec<Endpoint>,
    ) -> Result<ApplyReport, crate::Error> {
        self.apply_changes(cancel, Changeset::from_endpoints(Action::Create, endpoints))
            .await
    }

    /// Replace the given records with the new content
    async fn update_records(
        &self,
        cancel: &CancellationToken,
        endpoints: Vec<Endpoint>,
    ) -> Result<ApplyReport, crate::Error> {
        self.apply_changes(cancel, Changeset::from_endpoints(Action::Update, endpoints))
            .await
    }

    /// Delete the given records
    async fn delete_records(
        &self,
        cancel: &CancellationToken,
        endpoints: Vec<Endpoint>,
    ) -> Result<ApplyReport, crate::Error> {
        self.apply_changes(cancel, Changeset::from_endpoints(Action::Delete, endpoints))
            .await
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
///
/// Construction is async because providers may need to authenticate before
/// they are usable.
#[async_trait]
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object, or the error that prevented the
    /// provider from being built (e.g. a failed login)
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
