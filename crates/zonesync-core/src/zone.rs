//! Zones and zone filtering
//!
//! A [`Zone`] is owned by the backend; zonesync only ever holds a snapshot
//! taken at the start of an operation. [`ZoneFilter`] is the pure predicate
//! that decides which of the backend's zones are in scope.

use crate::config::ZoneFilterConfig;
use crate::endpoint::normalize_name;
use serde::{Deserialize, Serialize};

/// A DNS zone managed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Backend identifier
    pub id: String,
    /// Zone name, e.g. "example.com"
    pub name: String,
    /// Backend zone type (e.g. "public", "private"), if reported
    #[serde(default)]
    pub zone_type: Option<String>,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl AsRef<str>) -> Self {
        Self {
            id: id.into(),
            name: normalize_name(name.as_ref()),
            zone_type: None,
        }
    }

    pub fn with_type(mut self, zone_type: impl Into<String>) -> Self {
        self.zone_type = Some(zone_type.into());
        self
    }

    /// Whether `dns_name` equals the zone name or sits below it
    pub fn contains(&self, dns_name: &str) -> bool {
        is_subdomain(&normalize_name(dns_name), &self.name)
    }
}

/// `name == parent` or `name` ends with `.parent`, on normalized names
fn is_subdomain(name: &str, parent: &str) -> bool {
    if parent.is_empty() {
        return false;
    }
    name == parent
        || (name.len() > parent.len()
            && name.ends_with(parent)
            && name.as_bytes()[name.len() - parent.len() - 1] == b'.')
}

/// Inclusion filter over zone metadata
///
/// Each criterion matches everything when left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneFilter {
    domains: Vec<String>,
    zone_ids: Vec<String>,
    zone_type: Option<String>,
}

impl ZoneFilter {
    /// A filter that accepts every zone
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to zones at or below any of the given domains
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.domains = domains
            .into_iter()
            .map(|d| normalize_name(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    /// Restrict to the given zone identifiers
    pub fn with_zone_ids<I, S>(mut self, zone_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zone_ids = zone_ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| !id.trim().is_empty())
            .collect();
        self
    }

    /// Restrict to one zone type (case-insensitive)
    pub fn with_zone_type(mut self, zone_type: Option<String>) -> Self {
        self.zone_type = zone_type
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty());
        self
    }

    /// Check a zone against every configured criterion
    pub fn matches(&self, zone: &Zone) -> bool {
        self.matches_domain(zone) && self.matches_zone_id(zone) && self.matches_zone_type(zone)
    }

    fn matches_domain(&self, zone: &Zone) -> bool {
        self.domains.is_empty()
            || self
                .domains
                .iter()
                .any(|domain| is_subdomain(&zone.name, domain))
    }

    fn matches_zone_id(&self, zone: &Zone) -> bool {
        self.zone_ids.is_empty() || self.zone_ids.iter().any(|id| *id == zone.id)
    }

    fn matches_zone_type(&self, zone: &Zone) -> bool {
        match &self.zone_type {
            None => true,
            Some(wanted) => zone
                .zone_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(wanted)),
        }
    }
}

impl From<&ZoneFilterConfig> for ZoneFilter {
    fn from(config: &ZoneFilterConfig) -> Self {
        ZoneFilter::new()
            .with_domains(&config.domains)
            .with_zone_ids(config.zone_ids.iter().cloned())
            .with_zone_type(config.zone_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let zone = Zone::new("1", "example.com.");
        assert!(zone.contains("example.com"));
        assert!(zone.contains("www.Example.com"));
        assert!(!zone.contains("badexample.com"));
        assert!(!zone.contains("example.org"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ZoneFilter::new();
        assert!(filter.matches(&Zone::new("1", "example.com")));
        assert!(filter.matches(&Zone::new("2", "other.org").with_type("private")));
    }

    #[test]
    fn test_domain_filter() {
        let filter = ZoneFilter::new().with_domains(["example.com"]);
        assert!(filter.matches(&Zone::new("1", "a.example.com")));
        assert!(filter.matches(&Zone::new("2", "example.com")));
        assert!(!filter.matches(&Zone::new("3", "c.other.org")));
        assert!(!filter.matches(&Zone::new("4", "notexample.com")));
    }

    #[test]
    fn test_zone_id_filter() {
        let filter = ZoneFilter::new().with_zone_ids(["z1", ""]);
        assert!(filter.matches(&Zone::new("z1", "a.example.com")));
        assert!(!filter.matches(&Zone::new("z2", "a.example.com")));
    }

    #[test]
    fn test_zone_type_filter() {
        let filter = ZoneFilter::new().with_zone_type(Some("Public".to_string()));
        assert!(filter.matches(&Zone::new("1", "a.example.com").with_type("public")));
        assert!(!filter.matches(&Zone::new("2", "b.example.com").with_type("private")));
        assert!(!filter.matches(&Zone::new("3", "c.example.com")));
    }

    #[test]
    fn test_filter_from_config() {
        let config = ZoneFilterConfig {
            domains: vec!["example.com".to_string()],
            zone_ids: vec![],
            zone_type: Some(String::new()),
        };
        let filter = ZoneFilter::from(&config);
        assert!(filter.matches(&Zone::new("1", "a.example.com")));
        assert!(!filter.matches(&Zone::new("2", "a.example.org")));
    }
}
