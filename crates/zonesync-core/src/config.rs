//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.
//! Nothing here is process-global: every provider receives its configuration
//! at construction time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// BlueCat Address Manager (REST v1, session based)
    #[serde(rename = "bluecat")]
    BlueCat(BlueCatConfig),

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::BlueCat(config) => config.validate(),
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::BlueCat(_) => "bluecat",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// BlueCat provider configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BlueCatConfig {
    /// Server address: a host (`bam.example.net`) or a base URL with scheme
    pub server: String,

    /// API user name
    pub username: String,

    /// API password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure_tls: bool,

    /// Compute and log mutations without sending them
    #[serde(default)]
    pub dry_run: bool,

    /// BlueCat configuration name the zones live under
    #[serde(default)]
    pub configuration: Option<String>,

    /// DNS view the zones live under
    #[serde(default)]
    pub view: Option<String>,

    /// Which zones are in scope
    #[serde(default)]
    pub zone_filter: ZoneFilterConfig,
}

impl BlueCatConfig {
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_zone_filter(mut self, zone_filter: ZoneFilterConfig) -> Self {
        self.zone_filter = zone_filter;
        self
    }

    /// Validate the BlueCat configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.trim().is_empty() {
            return Err(crate::Error::config("BlueCat server address cannot be empty"));
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("BlueCat username cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("BlueCat password cannot be empty"));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the password
impl fmt::Debug for BlueCatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueCatConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("insecure_tls", &self.insecure_tls)
            .field("dry_run", &self.dry_run)
            .field("configuration", &self.configuration)
            .field("view", &self.view)
            .field("zone_filter", &self.zone_filter)
            .finish()
    }
}

/// Zone inclusion filters
///
/// Empty lists (and a missing zone type) match every zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFilterConfig {
    /// Domain suffixes; a zone matches when its name is at or below one of them
    #[serde(default)]
    pub domains: Vec<String>,

    /// Backend zone identifiers
    #[serde(default)]
    pub zone_ids: Vec<String>,

    /// Backend zone type
    #[serde(default)]
    pub zone_type: Option<String>,
}
