//! BlueCat session management
//!
//! BlueCat's REST v1 API authenticates with a session token obtained from
//! `GET /login?username=..&password=..`. The response is plain text with the
//! token embedded after a `BAMAuthToken:` marker; every later request sends
//! `Authorization: BAMAuthToken: <token>`.
//!
//! ## Security
//!
//! The login URL carries the password as a query parameter. It is never
//! logged, and transport errors are stripped of their URL and of any
//! credential-looking query values before they leave this module.
//!
//! ## Refresh
//!
//! The current [`Session`] sits behind a `tokio::sync::RwLock`: requests take
//! a read lock just long enough to clone it, and only [`SessionManager::refresh`]
//! writes. Each session carries a version; a refresh requested against a
//! version that has already been replaced is a no-op, so concurrent requests
//! that all saw the same expired token trigger a single re-login.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tokio::sync::RwLock;
use tracing::{debug, info};
use zonesync_core::{Error, Result};

/// Marker preceding the token in the login response
pub const TOKEN_MARKER: &str = "BAMAuthToken:";

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BAMAuthToken:\s+([A-Za-z0-9_=]+)").expect("valid token pattern"));

static CREDENTIAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(password|username)=[^&\s)]*").expect("valid credential pattern")
});

/// Longest slice of a login response quoted in an error
const MAX_QUOTED_BODY: usize = 200;

/// An opaque BlueCat session token
///
/// The Debug implementation intentionally does NOT expose the token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Raw token value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("{} {}", TOKEN_MARKER, self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<REDACTED>)")
    }
}

/// Extract the session token from a login response body
///
/// The body must contain `BAMAuthToken:` followed by whitespace and a token
/// made of ASCII letters, digits, `_` and `=`.
///
/// # Errors
///
/// `Authentication` quoting (a prefix of) the body when the marker or token
/// is missing. A missing token is never turned into an empty one.
pub fn extract_token(body: &str) -> Result<SessionToken> {
    TOKEN_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|token| SessionToken(token.as_str().to_string()))
        .ok_or_else(|| {
            let quoted: String = body.chars().take(MAX_QUOTED_BODY).collect();
            Error::auth(format!("no session token in login response: {:?}", quoted.trim()))
        })
}

/// Replace credential query values (`password=..`, `username=..`) in a message
pub fn redact_credentials(message: &str) -> String {
    CREDENTIAL_PATTERN
        .replace_all(message, "$1=<redacted>")
        .into_owned()
}

/// Describe a transport error without its URL or any credentials
pub fn sanitize_transport_error(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut message = err.to_string();

    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    redact_credentials(&message)
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    /// Token sent with every request
    pub token: SessionToken,
    /// User the session was acquired for
    pub username: String,
    /// Server address the session belongs to
    pub server: String,
    /// Incremented on every re-login
    pub version: u64,
    /// When the token was obtained
    pub acquired_at: DateTime<Utc>,
}

/// Owns the session for one provider instance
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    username: String,
    /// ⚠️ NEVER log this value
    password: String,
    current: RwLock<Session>,
}

// Custom Debug implementation that hides the password and token
impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Log in and hold the resulting session
    ///
    /// # Parameters
    ///
    /// - `http`: Shared HTTP client
    /// - `base_url`: REST API base, e.g. `https://bam.local/Services/REST/v1`
    /// - `username`, `password`: API credentials
    ///
    /// # Errors
    ///
    /// `Authentication` if the login call fails or no token can be extracted.
    /// A provider cannot be built without a session.
    pub async fn acquire(
        http: reqwest::Client,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let username = username.into();
        let password = password.into();

        let token = login(&http, &base_url, &username, &password).await?;
        info!(server = %base_url, user = %username, "BlueCat session acquired");

        let session = Session {
            token,
            username: username.clone(),
            server: base_url.clone(),
            version: 1,
            acquired_at: Utc::now(),
        };

        Ok(Self {
            http,
            base_url,
            username,
            password,
            current: RwLock::new(session),
        })
    }

    /// Snapshot of the current session
    pub async fn current(&self) -> Session {
        self.current.read().await.clone()
    }

    /// Re-login if `stale_version` is still the current session
    ///
    /// Returns the version in effect afterwards. Requests in flight keep the
    /// token they already cloned.
    pub async fn refresh(&self, stale_version: u64) -> Result<u64> {
        let mut current = self.current.write().await;
        if current.version != stale_version {
            debug!(
                stale_version,
                current_version = current.version,
                "Session already refreshed"
            );
            return Ok(current.version);
        }

        let token = login(&self.http, &self.base_url, &self.username, &self.password).await?;
        current.token = token;
        current.version += 1;
        current.acquired_at = Utc::now();

        info!(
            server = %self.base_url,
            version = current.version,
            "BlueCat session refreshed"
        );
        Ok(current.version)
    }
}

/// Perform the login exchange
///
/// # API Call
///
/// ```http
/// GET /Services/REST/v1/login?username=<user>&password=<pass>
/// ```
async fn login(
    http: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<SessionToken> {
    let response = http
        .get(format!("{}/login", base_url))
        .query(&[("username", username), ("password", password)])
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(|e| Error::auth(format!("{} - login", sanitize_transport_error(e))))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::auth(format!("{} - login body", sanitize_transport_error(e))))?;

    if !status.is_success() {
        let quoted: String = body.chars().take(MAX_QUOTED_BODY).collect();
        return Err(Error::auth(format!(
            "login rejected with status {}: {}",
            status,
            redact_credentials(quoted.trim())
        )));
    }

    extract_token(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const LOGIN_BODY: &str =
        "\"Session Token-> BAMAuthToken: 2ZzTtUjtiQ3ki4aSnbb0dCMHyyDzWTiVzZmZjYzJjZTQ= <- for User : api\"";

    fn base(server: &MockServer) -> String {
        format!("{}/Services/REST/v1", server.base_url())
    }

    #[test]
    fn test_extract_token() {
        let token = extract_token(LOGIN_BODY).unwrap();
        assert_eq!(token.as_str(), "2ZzTtUjtiQ3ki4aSnbb0dCMHyyDzWTiVzZmZjYzJjZTQ=");
        assert_eq!(
            token.header_value(),
            "BAMAuthToken: 2ZzTtUjtiQ3ki4aSnbb0dCMHyyDzWTiVzZmZjYzJjZTQ="
        );
    }

    #[test]
    fn test_extract_token_missing_marker() {
        let err = extract_token("Authentication Error: Invalid username or password").unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("Invalid username"));
    }

    #[test]
    fn test_extract_token_marker_without_token() {
        assert!(extract_token("BAMAuthToken: ").is_err());
        assert!(extract_token("BAMAuthToken:abc").is_err());
    }

    #[test]
    fn test_extract_token_is_ascii_only() {
        assert!(extract_token("BAMAuthToken: ÄÖü <- for User : api").is_err());

        let token = extract_token("BAMAuthToken: abc1=ünicode").unwrap();
        assert_eq!(token.as_str(), "abc1=");
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let token = extract_token(LOGIN_BODY).unwrap();
        let debug_str = format!("{:?}", token);
        assert!(!debug_str.contains("2ZzTtUjt"));
    }

    #[test]
    fn test_redact_credentials() {
        let msg = "error sending request for url (https://bam/login?username=api&password=hunter2)";
        let redacted = redact_credentials(msg);
        assert!(!redacted.contains("hunter2"));
        assert!(!redacted.contains("username=api"));
        assert!(redacted.contains("password=<redacted>"));
    }

    #[tokio::test]
    async fn test_acquire_session() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/Services/REST/v1/login")
                    .query_param("username", "api")
                    .query_param("password", "s3cret");
                then.status(200).body(LOGIN_BODY);
            })
            .await;

        let manager = SessionManager::acquire(reqwest::Client::new(), base(&server), "api", "s3cret")
            .await
            .unwrap();

        login.assert_async().await;
        let session = manager.current().await;
        assert_eq!(session.version, 1);
        assert_eq!(session.username, "api");
        assert!(session.token.as_str().starts_with("2ZzTtUjt"));
    }

    #[tokio::test]
    async fn test_acquire_fails_without_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/Services/REST/v1/login");
                then.status(200).body("Welcome");
            })
            .await;

        let err = SessionManager::acquire(reqwest::Client::new(), base(&server), "api", "s3cret")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_rejected_login_is_authentication_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/Services/REST/v1/login");
                then.status(401).body("Invalid username or password");
            })
            .await;

        let err = SessionManager::acquire(reqwest::Client::new(), base(&server), "api", "s3cret")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!err.to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn test_transport_error_hides_password() {
        // Bind then drop a listener so the port is known to be closed
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let base_url = format!("http://127.0.0.1:{}/Services/REST/v1", port);

        let err = SessionManager::acquire(reqwest::Client::new(), base_url, "api", "s3cret-pass")
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!msg.contains("s3cret-pass"), "password leaked: {}", msg);
        assert!(!msg.contains("password=s3cret"), "URL leaked: {}", msg);
    }

    #[tokio::test]
    async fn test_refresh_is_versioned() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(GET).path("/Services/REST/v1/login");
                then.status(200).body(LOGIN_BODY);
            })
            .await;

        let manager = SessionManager::acquire(reqwest::Client::new(), base(&server), "api", "s3cret")
            .await
            .unwrap();

        assert_eq!(manager.refresh(1).await.unwrap(), 2);
        // a second caller that also saw version 1 does not log in again
        assert_eq!(manager.refresh(1).await.unwrap(), 2);

        login.assert_hits_async(2).await;
        assert_eq!(manager.current().await.version, 2);
    }

    #[tokio::test]
    async fn test_manager_debug_hides_password() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/Services/REST/v1/login");
                then.status(200).body(LOGIN_BODY);
            })
            .await;

        let manager = SessionManager::acquire(
            reqwest::Client::new(),
            base(&server),
            "api",
            "very-secret-password",
        )
        .await
        .unwrap();

        let debug_str = format!("{:?}", manager);
        assert!(!debug_str.contains("very-secret-password"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
