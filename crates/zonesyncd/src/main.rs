// # zonesyncd - one reconciliation pass
//
// This binary is a thin integration layer. All DNS logic lives in
// zonesync-core and the provider crates.
//
// The zonesyncd binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers and building the configured one
// 4. Applying an optional changeset file
// 5. Printing the resulting record inventory as JSON on stdout
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (bluecat)
// - `ZONESYNC_SERVER`: Server host or base URL
// - `ZONESYNC_USERNAME` / `ZONESYNC_PASSWORD`: API credentials
// - `ZONESYNC_INSECURE_TLS`: Skip certificate verification (default false)
// - `ZONESYNC_DRY_RUN`: Log changes without sending them (default false)
// - `ZONESYNC_CONFIGURATION` / `ZONESYNC_VIEW`: Zone listing scope (optional)
//
// ### Zone filter
// - `ZONESYNC_DOMAIN_FILTER`: Comma-separated domain suffixes
// - `ZONESYNC_ZONE_ID_FILTER`: Comma-separated zone ids
// - `ZONESYNC_ZONE_TYPE`: Zone type as the backend reports it (e.g. public, private)
//
// ### Run
// - `ZONESYNC_CHANGES_FILE`: JSON changeset to apply before listing (optional)
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export ZONESYNC_SERVER=bam.example.net
// export ZONESYNC_USERNAME=api
// export ZONESYNC_PASSWORD=secret
// export ZONESYNC_DOMAIN_FILTER=example.com
// export ZONESYNC_CHANGES_FILE=/etc/zonesync/changes.json
// export ZONESYNC_DRY_RUN=true
//
// zonesyncd > records.json
// ```

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{BlueCatConfig, Changeset, ProviderConfig, ProviderRegistry, ZoneFilterConfig};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Pass completed
/// - 1: Configuration, startup or authentication error
/// - 2: Runtime error (including an interrupted pass)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Pass completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl ZonesyncExitCode {
    /// Classify a failed pass
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<zonesync_core::Error>() {
            Some(zonesync_core::Error::Authentication(_) | zonesync_core::Error::Config(_)) => {
                ZonesyncExitCode::ConfigError
            }
            _ => ZonesyncExitCode::RuntimeError,
        }
    }
}

/// Application configuration
struct Config {
    provider_type: String,
    server: String,
    username: String,
    password: String,
    insecure_tls: bool,
    dry_run: bool,
    configuration: Option<String>,
    view: Option<String>,
    domain_filter: Vec<String>,
    zone_id_filter: Vec<String>,
    zone_type: Option<String>,
    changes_file: Option<PathBuf>,
    log_level: String,
}

// Custom Debug implementation that hides the password
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider_type", &self.provider_type)
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("insecure_tls", &self.insecure_tls)
            .field("dry_run", &self.dry_run)
            .field("configuration", &self.configuration)
            .field("view", &self.view)
            .field("domain_filter", &self.domain_filter)
            .field("zone_id_filter", &self.zone_id_filter)
            .field("zone_type", &self.zone_type)
            .field("changes_file", &self.changes_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| -> Result<bool> {
            match non_empty(key) {
                Some(value) => parse_bool(key, &value),
                None => Ok(false),
            }
        };

        Ok(Self {
            provider_type: non_empty("ZONESYNC_PROVIDER_TYPE")
                .unwrap_or_else(|| "bluecat".to_string()),
            server: lookup("ZONESYNC_SERVER").unwrap_or_default(),
            username: lookup("ZONESYNC_USERNAME").unwrap_or_default(),
            password: lookup("ZONESYNC_PASSWORD").unwrap_or_default(),
            insecure_tls: flag("ZONESYNC_INSECURE_TLS")?,
            dry_run: flag("ZONESYNC_DRY_RUN")?,
            configuration: non_empty("ZONESYNC_CONFIGURATION"),
            view: non_empty("ZONESYNC_VIEW"),
            domain_filter: split_list(lookup("ZONESYNC_DOMAIN_FILTER")),
            zone_id_filter: split_list(lookup("ZONESYNC_ZONE_ID_FILTER")),
            zone_type: non_empty("ZONESYNC_ZONE_TYPE"),
            changes_file: non_empty("ZONESYNC_CHANGES_FILE").map(PathBuf::from),
            log_level: non_empty("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "bluecat" => {}
            _ => anyhow::bail!(
                "ZONESYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: bluecat",
                self.provider_type
            ),
        }

        if self.server.trim().is_empty() {
            anyhow::bail!(
                "ZONESYNC_SERVER is required. \
                Set it via: export ZONESYNC_SERVER=bam.example.net"
            );
        }
        if self.username.is_empty() || self.password.is_empty() {
            anyhow::bail!("ZONESYNC_USERNAME and ZONESYNC_PASSWORD are required");
        }

        if let Some(path) = &self.changes_file {
            if !path.is_file() {
                anyhow::bail!("ZONESYNC_CHANGES_FILE does not exist: {}", path.display());
            }
        }

        if self.insecure_tls {
            eprintln!(
                "WARNING: ZONESYNC_INSECURE_TLS is set. \
                Server certificates will not be verified."
            );
        }

        parse_level(&self.log_level)?;
        self.provider_config().validate()?;
        Ok(())
    }

    /// Provider configuration handed to the registry
    fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::BlueCat(BlueCatConfig {
            server: self.server.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            insecure_tls: self.insecure_tls,
            dry_run: self.dry_run,
            configuration: self.configuration.clone(),
            view: self.view.clone(),
            zone_filter: ZoneFilterConfig {
                domains: self.domain_filter.clone(),
                zone_ids: self.zone_id_filter.clone(),
                zone_type: self.zone_type.clone(),
            },
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean (true/false). Got: {}", key, other),
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ZONESYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Read a JSON changeset from disk
fn load_changeset(path: &Path) -> Result<Changeset> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read changeset {}", path.display()))?;
    let changes = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid changeset {}", path.display()))?;
    Ok(changes)
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let cancel = CancellationToken::new();
        tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

        match run(config, &cancel).await {
            Ok(()) => ZonesyncExitCode::Success,
            Err(e) => {
                error!("Reconciliation failed: {:#}", e);
                ZonesyncExitCode::for_error(&e)
            }
        }
    });

    result.into()
}

/// Run a single reconciliation pass
async fn run(config: Config, cancel: &CancellationToken) -> Result<()> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "bluecat")]
    {
        info!("Registering BlueCat provider");
        zonesync_provider_bluecat::register(&registry);
    }

    let provider_config = config.provider_config();
    let provider = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(zonesync_core::Error::Cancelled.into()),
        provider = registry.create_provider(&provider_config) => provider?,
    };
    info!("Provider ready: {}", provider.provider_name());

    if let Some(path) = &config.changes_file {
        let changes = load_changeset(path)?;
        info!("Applying {} change(s) from {}", changes.len(), path.display());

        let report = provider.apply_changes(cancel, changes).await?;
        info!(
            applied = report.applied,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "Changeset finished"
        );
    }

    let records = provider.records(cancel).await?;
    info!("{} record(s) in scope", records.len());
    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}

/// Cancel the pass on SIGTERM or SIGINT
#[cfg(unix)]
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to set up signal handlers: {}", e);
                return;
            }
        };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    warn!("Received {}, cancelling", received);
    cancel.cancel();
}

/// Cancel the pass on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received CTRL-C, cancelling");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to wait for CTRL-C: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use zonesync_core::{Action, RecordType};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ZONESYNC_SERVER", "bam.example.net"),
            ("ZONESYNC_USERNAME", "api"),
            ("ZONESYNC_PASSWORD", "secret"),
        ]
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&base_vars())).unwrap();
        assert_eq!(config.provider_type, "bluecat");
        assert_eq!(config.log_level, "info");
        assert!(!config.dry_run);
        assert!(!config.insecure_tls);
        assert!(config.changes_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builds_provider_config() {
        let mut vars = base_vars();
        vars.extend([
            ("ZONESYNC_DRY_RUN", "true"),
            ("ZONESYNC_VIEW", "internal"),
            ("ZONESYNC_DOMAIN_FILTER", "example.com, example.org,"),
            ("ZONESYNC_ZONE_ID_FILTER", "1001"),
            ("ZONESYNC_ZONE_TYPE", "private"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert!(config.validate().is_ok());

        match config.provider_config() {
            ProviderConfig::BlueCat(bluecat) => {
                assert!(bluecat.dry_run);
                assert_eq!(bluecat.view.as_deref(), Some("internal"));
                assert_eq!(bluecat.configuration, None);
                assert_eq!(
                    bluecat.zone_filter.domains,
                    vec!["example.com".to_string(), "example.org".to_string()]
                );
                assert_eq!(bluecat.zone_filter.zone_ids, vec!["1001".to_string()]);
                assert_eq!(bluecat.zone_filter.zone_type.as_deref(), Some("private"));
            }
            other => panic!("unexpected provider config: {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_missing_credentials() {
        let config = Config::from_lookup(lookup(&[("ZONESYNC_SERVER", "bam.example.net")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_unknown_provider_and_level() {
        let mut vars = base_vars();
        vars.push(("ZONESYNC_PROVIDER_TYPE", "route53"));
        assert!(Config::from_lookup(lookup(&vars)).unwrap().validate().is_err());

        let mut vars = base_vars();
        vars.push(("ZONESYNC_LOG_LEVEL", "loud"));
        assert!(Config::from_lookup(lookup(&vars)).unwrap().validate().is_err());
    }

    #[test]
    fn test_config_passes_any_zone_type_through() {
        let mut vars = base_vars();
        vars.push(("ZONESYNC_ZONE_TYPE", "Internal-Split"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert!(config.validate().is_ok());

        match config.provider_config() {
            ProviderConfig::BlueCat(bluecat) => {
                assert_eq!(bluecat.zone_filter.zone_type.as_deref(), Some("Internal-Split"));
            }
            other => panic!("unexpected provider config: {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_bad_boolean() {
        let mut vars = base_vars();
        vars.push(("ZONESYNC_INSECURE_TLS", "maybe"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_config_rejects_missing_changes_file() {
        let mut vars = base_vars();
        vars.push(("ZONESYNC_CHANGES_FILE", "/nonexistent/changes.json"));
        assert!(Config::from_lookup(lookup(&vars)).unwrap().validate().is_err());
    }

    #[test]
    fn test_config_debug_hides_password() {
        let config = Config::from_lookup(lookup(&base_vars())).unwrap();
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_load_changeset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"action": "create", "endpoint": {{"dns_name": "x.example.com", "record_type": "A", "targets": ["1.2.3.4"]}}}},
                {{"action": "delete", "endpoint": {{"dns_name": "old.example.com", "record_type": "CNAME", "targets": ["x.example.com"]}}}}
            ]"#
        )
        .unwrap();

        let changes = load_changeset(file.path()).unwrap();
        let changes = changes.into_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].action, Action::Create);
        assert_eq!(changes[1].endpoint.record_type(), RecordType::Cname);
    }

    #[test]
    fn test_load_changeset_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_changeset(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid changeset"));
    }

    #[test]
    fn test_exit_code_classification() {
        let auth: anyhow::Error = zonesync_core::Error::auth("login rejected").into();
        assert_eq!(ZonesyncExitCode::for_error(&auth), ZonesyncExitCode::ConfigError);

        let cancelled: anyhow::Error = zonesync_core::Error::Cancelled.into();
        assert_eq!(ZonesyncExitCode::for_error(&cancelled), ZonesyncExitCode::RuntimeError);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(ZonesyncExitCode::for_error(&other), ZonesyncExitCode::RuntimeError);
    }
}
