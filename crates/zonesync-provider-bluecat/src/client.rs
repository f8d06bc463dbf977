//! BlueCat REST v1 client
//!
//! [`BlueCatClient`] implements [`ZoneBackend`] over reqwest. Every call
//! carries the current session token; one HTTP request per trait method.
//!
//! ## API Reference
//!
//! - List zones: GET `/zones?configuration=..&view=..`
//! - Zone detail: GET `/zones/:zone`
//! - Create record: POST `/zones/:zone/records`
//! - Update record: PUT `/zones/:zone/records/:domain/:type`
//! - Delete record: DELETE `/zones/:zone/records/:domain/:type`

use crate::session::{SessionManager, sanitize_transport_error};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zonesync_core::config::BlueCatConfig;
use zonesync_core::{Error, Result, Zone, ZoneBackend, ZoneRecord};

/// Path of the REST API below the server address
pub const REST_API_PREFIX: &str = "Services/REST/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "bluecat";

/// REST API base URL for a server address
///
/// A bare host gets `https://`; an address that already has a scheme is used
/// as given.
pub fn api_base(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.contains("://") {
        format!("{}/{}", server, REST_API_PREFIX)
    } else {
        format!("https://{}/{}", server, REST_API_PREFIX)
    }
}

/// Build `{base}/{segments..}` with each segment percent-encoded
///
/// Zone and record names are never spliced into the path as raw text.
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("BlueCat API address cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Numeric or string object id, as BlueCat returns either
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Number(n) => write!(f, "{}", n),
            ObjectId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    id: ObjectId,
    name: String,
    #[serde(rename = "type", default)]
    zone_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZoneDetail {
    #[serde(default)]
    records: Vec<RecordEntry>,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    domain: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    short_answers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    domain: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    answers: &'a [String],
}

impl<'a> From<&'a ZoneRecord> for RecordPayload<'a> {
    fn from(record: &'a ZoneRecord) -> Self {
        Self {
            domain: &record.domain,
            record_type: &record.record_type,
            ttl: record.ttl,
            answers: &record.answers,
        }
    }
}

/// BlueCat Address Manager backend
pub struct BlueCatClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionManager,
    configuration: Option<String>,
    view: Option<String>,
}

impl fmt::Debug for BlueCatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueCatClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("configuration", &self.configuration)
            .field("view", &self.view)
            .finish()
    }
}

impl BlueCatClient {
    /// Build the HTTP client and log in
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration is invalid or the HTTP client cannot be built
    /// - `Authentication` if the login fails
    pub async fn connect(config: &BlueCatConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if config.insecure_tls {
            tracing::warn!("TLS certificate verification disabled for {}", config.server);
        }

        let api = api_base(&config.server);
        let base_url = Url::parse(&api).map_err(|e| {
            Error::config(format!("Invalid BlueCat server address {}: {}", config.server, e))
        })?;
        let session =
            SessionManager::acquire(http.clone(), api, &config.username, &config.password).await?;

        Ok(Self {
            http,
            base_url,
            session,
            configuration: config.configuration.clone(),
            view: config.view.clone(),
        })
    }

    /// The session this client authenticates with
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send one authenticated request and map non-success statuses to errors
    ///
    /// A 401 refreshes the session for later calls; the failed request itself
    /// is not repeated. A failed refresh is reported in the returned error.
    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<RecordPayload<'_>>,
    ) -> Result<reqwest::Response> {
        let session = self.session.current().await;
        let url = endpoint_url(&self.base_url, segments)?;
        let path = segments.join("/");
        let path = path.as_str();

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header("Authorization", session.token.header_value())
            .header("Content-Type", "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        tracing::debug!("{} {}", method, path);
        let response = builder.send().await.map_err(|e| {
            Error::http(format!("{} {} failed: {}", method, path, sanitize_transport_error(e)))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let refresh_failure = if status == StatusCode::UNAUTHORIZED {
            match self.session.refresh(session.version).await {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Session refresh failed: {}", e);
                    Some(e)
                }
            }
        } else {
            None
        };

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        let mut err = status_error(status, &error_text, &method, path);
        if let (Some(refresh_err), Error::Authentication(message)) = (refresh_failure, &mut err) {
            message.push_str(&format!("; session refresh failed: {}", refresh_err));
        }
        Err(err)
    }
}

/// Map an HTTP error status to the matching error kind
fn status_error(status: StatusCode, error_text: &str, method: &Method, path: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{} {} rejected: session expired or insufficient permissions. Status: {}",
            method, path, status
        )),
        404 => Error::not_found(format!("{} ({})", path, error_text.trim())),
        409 => Error::already_exists(format!("{} ({})", path, error_text.trim())),
        429 => Error::rate_limited(format!("Rate limit exceeded. Status: {}", status)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("BlueCat server error (transient): {} - {}", status, error_text.trim()),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("{} {} failed: {} - {}", method, path, status, error_text.trim()),
        ),
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e.without_url())))
}

#[async_trait]
impl ZoneBackend for BlueCatClient {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut query = Vec::new();
        if let Some(configuration) = &self.configuration {
            query.push(("configuration", configuration.as_str()));
        }
        if let Some(view) = &self.view {
            query.push(("view", view.as_str()));
        }

        let response = self.request(Method::GET, &["zones"], &query, None).await?;
        let entries: Vec<ZoneEntry> = parse_json(response).await?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let zone = Zone::new(entry.id.to_string(), &entry.name);
                match entry.zone_type {
                    Some(zone_type) => zone.with_type(zone_type),
                    None => zone,
                }
            })
            .collect())
    }

    async fn zone_records(&self, zone: &Zone) -> Result<Vec<ZoneRecord>> {
        let response = self
            .request(Method::GET, &["zones", zone.name.as_str()], &[], None)
            .await?;
        let detail: ZoneDetail = parse_json(response).await?;

        Ok(detail
            .records
            .into_iter()
            .map(|entry| ZoneRecord {
                zone: zone.name.clone(),
                domain: entry.domain,
                record_type: entry.record_type,
                ttl: entry.ttl,
                answers: entry.short_answers,
            })
            .collect())
    }

    async fn create_record(&self, record: &ZoneRecord) -> Result<()> {
        let segments = ["zones", record.zone.as_str(), "records"];
        self.request(Method::POST, &segments, &[], Some(record.into()))
            .await?;
        Ok(())
    }

    async fn update_record(&self, record: &ZoneRecord) -> Result<()> {
        let segments = [
            "zones",
            record.zone.as_str(),
            "records",
            record.domain.as_str(),
            record.record_type.as_str(),
        ];
        self.request(Method::PUT, &segments, &[], Some(record.into()))
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone: &Zone, domain: &str, record_type: &str) -> Result<()> {
        let segments = ["zones", zone.name.as_str(), "records", domain, record_type];
        self.request(Method::DELETE, &segments, &[], None).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        PROVIDER
    }
}
