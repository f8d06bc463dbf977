// # zonesync-core
//
// Core library for reconciling a desired set of DNS records against the
// actual state held by a remote DNS management backend.
//
// ## Architecture Overview
//
// - **Endpoint / Changeset**: Backend-neutral record and mutation model
// - **DnsProvider**: Capability trait the orchestrator consumes
// - **ZoneBackend**: Trait for the remote API a provider drives
// - **reconcile**: Zone directory, state reader, change planner, change applier
// - **ZoneProvider**: Generic DnsProvider over any ZoneBackend
// - **ProviderRegistry**: Plugin-based registry for provider factories
//
// ## Design Principles
//
// 1. **Plan before mutating**: every change is assigned to a zone up front
// 2. **Fail fast, no rollback**: the first backend error ends the batch
// 3. **Eventually consistent**: the next cycle re-diffs whatever is left
// 4. **No hidden state**: configuration is passed in, nothing is persisted

pub mod config;
pub mod endpoint;
pub mod error;
pub mod provider;
pub mod reconcile;
pub mod registry;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use config::{BlueCatConfig, ProviderConfig, ZoneFilterConfig};
pub use endpoint::{Action, Change, Changeset, DEFAULT_TTL, Endpoint, RecordType};
pub use error::{Error, Result};
pub use provider::ZoneProvider;
pub use reconcile::ApplyReport;
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory, ZoneBackend, ZoneRecord};
pub use zone::{Zone, ZoneFilter};
