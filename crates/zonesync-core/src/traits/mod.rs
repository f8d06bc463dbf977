//! Core traits for zonesync
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: The capability surface consumed by the orchestrator
//! - [`ZoneBackend`]: The remote DNS management API a provider drives

pub mod dns_provider;
pub mod zone_backend;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
pub use zone_backend::{ZoneBackend, ZoneRecord};
