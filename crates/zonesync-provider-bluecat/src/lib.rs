// # BlueCat DNS Provider
//
// This crate provides the BlueCat Address Manager backend for zonesync.
//
// ## Layout
//
// - `session`: login, token extraction, versioned session refresh
// - `client`: REST v1 calls behind the `ZoneBackend` trait
//
// The reconciliation logic (zone filtering, planning, dry-run, fail-fast
// apply) lives in `zonesync-core`; this crate only speaks the wire protocol.
// `BlueCatProvider` is the core `ZoneProvider` driving a `BlueCatClient`.
//
// ## Security Requirements
//
// - The password and session token NEVER appear in logs or Debug output
// - Transport errors are scrubbed of URLs and credential query values
// - Construction fails fast when credentials are missing or the login fails
//
// ## API Reference
//
// - Login: GET `/Services/REST/v1/login?username=..&password=..`
// - Zones: GET `/Services/REST/v1/zones`
// - Records: `/Services/REST/v1/zones/:zone/records[/:domain/:type]`

mod client;
mod session;

pub use client::{BlueCatClient, REST_API_PREFIX, api_base};
pub use session::{Session, SessionManager, SessionToken, extract_token, redact_credentials};

use async_trait::async_trait;
use zonesync_core::config::{BlueCatConfig, ProviderConfig};
use zonesync_core::traits::{DnsProvider, DnsProviderFactory};
use zonesync_core::{Error, Result, ZoneFilter, ZoneProvider};

/// Name the provider is registered under
pub const PROVIDER_NAME: &str = "bluecat";

/// BlueCat DNS provider
pub type BlueCatProvider = ZoneProvider<BlueCatClient>;

/// Log in to BlueCat and build a ready-to-use provider
///
/// # Errors
///
/// - `Config` if the configuration is incomplete
/// - `Authentication` if the login fails
pub async fn connect(config: &BlueCatConfig) -> Result<BlueCatProvider> {
    let client = BlueCatClient::connect(config).await?;
    let filter = ZoneFilter::from(&config.zone_filter);

    tracing::info!(
        server = %config.server,
        dry_run = config.dry_run,
        "BlueCat provider ready"
    );
    Ok(ZoneProvider::new(client, filter, config.dry_run))
}

/// Factory for creating BlueCat providers
pub struct BlueCatFactory;

#[async_trait]
impl DnsProviderFactory for BlueCatFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::BlueCat(config) => {
                let provider = connect(config).await?;
                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for BlueCat provider")),
        }
    }
}

/// Register the BlueCat provider with a registry
///
/// This function should be called during initialization to make the
/// BlueCat provider available.
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_bluecat::register(&registry);
/// assert!(registry.has_provider("bluecat"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(BlueCatFactory));
}
