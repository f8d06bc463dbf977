//! Generic DNS record model
//!
//! [`Endpoint`] is the backend-neutral record representation shared by the
//! orchestrator and every provider. [`Change`] and [`Changeset`] describe the
//! mutations the orchestrator wants applied.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// TTL applied when neither the orchestrator nor the backend sets one (10 minutes)
pub const DEFAULT_TTL: u32 = 600;

/// Record types managed by zonesync
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Text
    Txt,
    /// Mail exchange
    Mx,
    /// Name server
    Ns,
    /// Pointer
    Ptr,
    /// Service locator
    Srv,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Srv => "SRV",
        }
    }

    /// Parse a record type, returning `None` for types outside the managed set
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            "CNAME" => Some(RecordType::Cname),
            "TXT" => Some(RecordType::Txt),
            "MX" => Some(RecordType::Mx),
            "NS" => Some(RecordType::Ns),
            "PTR" => Some(RecordType::Ptr),
            "SRV" => Some(RecordType::Srv),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::parse(s)
            .ok_or_else(|| Error::invalid_input(format!("Unsupported record type: {}", s)))
    }
}

impl TryFrom<String> for RecordType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

/// Normalize a DNS name: lower-case, no surrounding whitespace, no trailing dot
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// A DNS record as seen by the orchestrator
///
/// Two endpoints are equal when they agree on name, type, effective TTL and
/// the *set* of targets; target order is not significant.
///
/// Fields are only reachable through accessors: an endpoint is validated once
/// in [`Endpoint::new`] / [`Endpoint::with_ttl`] and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawEndpoint")]
pub struct Endpoint {
    dns_name: String,
    record_type: RecordType,
    targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
}

#[derive(Deserialize)]
struct RawEndpoint {
    dns_name: String,
    record_type: RecordType,
    targets: Vec<String>,
    #[serde(default)]
    ttl: Option<u32>,
}

impl TryFrom<RawEndpoint> for Endpoint {
    type Error = Error;

    fn try_from(raw: RawEndpoint) -> Result<Self> {
        let endpoint = Endpoint::new(raw.dns_name, raw.record_type, raw.targets)?;
        match raw.ttl {
            Some(ttl) => endpoint.with_ttl(ttl),
            None => Ok(endpoint),
        }
    }
}

impl Endpoint {
    /// Create an endpoint without an explicit TTL
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the name is empty or no target is given.
    pub fn new<I, S>(dns_name: impl AsRef<str>, record_type: RecordType, targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dns_name = normalize_name(dns_name.as_ref());
        if dns_name.is_empty() {
            return Err(Error::invalid_input("Endpoint name cannot be empty"));
        }

        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        if targets.is_empty() {
            return Err(Error::invalid_input(format!(
                "Endpoint {} ({}) has no targets",
                dns_name, record_type
            )));
        }

        Ok(Self {
            dns_name,
            record_type,
            targets,
            ttl: None,
        })
    }

    /// Set an explicit TTL
    pub fn with_ttl(mut self, ttl: u32) -> Result<Self> {
        if ttl == 0 {
            return Err(Error::invalid_input(format!(
                "Endpoint {} has a zero TTL",
                self.dns_name
            )));
        }
        self.ttl = Some(ttl);
        Ok(self)
    }

    /// Fully-qualified record name, normalized
    pub fn dns_name(&self) -> &str {
        &self.dns_name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Record targets, never empty
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Explicit TTL in seconds; `None` means [`DEFAULT_TTL`]
    pub fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    /// TTL that will be written to, or was read from, the backend
    pub fn effective_ttl(&self) -> u32 {
        self.ttl.unwrap_or(DEFAULT_TTL)
    }

    fn target_set(&self) -> BTreeSet<&str> {
        self.targets.iter().map(String::as_str).collect()
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.dns_name == other.dns_name
            && self.record_type == other.record_type
            && self.effective_ttl() == other.effective_ttl()
            && self.target_set() == other.target_set()
    }
}

impl Eq for Endpoint {}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.dns_name,
            self.effective_ttl(),
            self.record_type,
            self.targets.join(", ")
        )
    }
}

/// Mutation requested by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requested mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub action: Action,
    pub endpoint: Endpoint,
}

impl Change {
    pub fn new(action: Action, endpoint: Endpoint) -> Self {
        Self { action, endpoint }
    }
}

/// Ordered list of mutations, consumed once by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changeset {
    changes: Vec<Change>,
}

impl Changeset {
    /// Create an empty changeset
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a changeset applying the same action to every endpoint
    pub fn from_endpoints(action: Action, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            changes: endpoints
                .into_iter()
                .map(|endpoint| Change::new(action, endpoint))
                .collect(),
        }
    }

    /// Append a change, keeping orchestrator order
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn create(mut self, endpoint: Endpoint) -> Self {
        self.push(Change::new(Action::Create, endpoint));
        self
    }

    pub fn update(mut self, endpoint: Endpoint) -> Self {
        self.push(Change::new(Action::Update, endpoint));
        self
    }

    pub fn delete(mut self, endpoint: Endpoint) -> Self {
        self.push(Change::new(Action::Delete, endpoint));
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

impl FromIterator<Change> for Changeset {
    fn from_iter<T: IntoIterator<Item = Change>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}
