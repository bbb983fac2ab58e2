//! Daemon configuration from `FASTIP_*` environment variables

use anyhow::Result;
use fastip_core::config::{Credential, EndpointConfig, ProviderConfig, ScheduleConfig, SyncConfig};
use fastip_core::config::{DEFAULT_DNS_ENDPOINT, DEFAULT_REGION};
use fastip_resolver_doh::DEFAULT_DOH_URL;
use std::env;
use std::net::SocketAddr;
use tracing::Level;

const DEFAULT_SOURCE_DOMAIN: &str = "zecrimp.top";
const DEFAULT_TARGET_DOMAIN: &str = "cf.hw.072103.xyz";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub access_key: String,
    pub secret_key: String,
    pub dns_endpoint: String,
    pub project_id: Option<String>,
    pub region: String,
    pub source_domain: String,
    pub target_domain: String,
    pub interval_secs: u64,
    pub run_timeout_secs: u64,
    pub listen_addr: String,
    pub doh_url: String,
    pub log_level: String,
    pub dry_run: bool,
}

// Custom Debug implementation that hides the secret key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<REDACTED>")
            .field("dns_endpoint", &self.dns_endpoint)
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .field("source_domain", &self.source_domain)
            .field("target_domain", &self.target_domain)
            .field("interval_secs", &self.interval_secs)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("listen_addr", &self.listen_addr)
            .field("doh_url", &self.doh_url)
            .field("log_level", &self.log_level)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let dry_run = match var("FASTIP_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("live") => false,
            Some("dry-run") => true,
            Some(other) => anyhow::bail!(
                "FASTIP_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            access_key: var("FASTIP_ACCESS_KEY").ok_or_else(|| {
                anyhow::anyhow!(
                    "FASTIP_ACCESS_KEY is required. \
                    Set it via: export FASTIP_ACCESS_KEY=your_access_key"
                )
            })?,
            secret_key: var("FASTIP_SECRET_KEY").ok_or_else(|| {
                anyhow::anyhow!(
                    "FASTIP_SECRET_KEY is required. \
                    Set it via: export FASTIP_SECRET_KEY=your_secret_key"
                )
            })?,
            dns_endpoint: or_default("FASTIP_DNS_ENDPOINT", DEFAULT_DNS_ENDPOINT),
            project_id: var("FASTIP_PROJECT_ID"),
            region: or_default("FASTIP_REGION", DEFAULT_REGION),
            source_domain: or_default("FASTIP_SOURCE_DOMAIN", DEFAULT_SOURCE_DOMAIN),
            target_domain: or_default("FASTIP_TARGET_DOMAIN", DEFAULT_TARGET_DOMAIN),
            interval_secs: parse_secs(var("FASTIP_INTERVAL_SECS"), "FASTIP_INTERVAL_SECS", 60)?,
            run_timeout_secs: parse_secs(
                var("FASTIP_RUN_TIMEOUT_SECS"),
                "FASTIP_RUN_TIMEOUT_SECS",
                30,
            )?,
            listen_addr: or_default("FASTIP_LISTEN_ADDR", DEFAULT_LISTEN_ADDR),
            doh_url: or_default("FASTIP_DOH_URL", DEFAULT_DOH_URL),
            log_level: or_default("FASTIP_LOG_LEVEL", "info"),
            dry_run,
        })
    }

    /// Validate the configuration
    ///
    /// Domain and credential checks are shared with the core library; this
    /// adds the daemon-only settings (ranges, addresses, log level).
    pub fn validate(&self) -> Result<()> {
        // Check for obvious placeholder credentials (common mistake)
        for (name, value) in [
            ("FASTIP_ACCESS_KEY", &self.access_key),
            ("FASTIP_SECRET_KEY", &self.secret_key),
        ] {
            let lower = value.to_lowercase();
            if lower.starts_with("your_") || lower.contains("replace_me") {
                anyhow::bail!(
                    "{} appears to be a placeholder. \
                    Use an actual access key pair from the IAM console.",
                    name
                );
            }
        }

        if !(10..=3600).contains(&self.interval_secs) {
            anyhow::bail!(
                "FASTIP_INTERVAL_SECS must be between 10 and 3600 seconds. Got: {}",
                self.interval_secs
            );
        }

        if !(1..=300).contains(&self.run_timeout_secs) {
            anyhow::bail!(
                "FASTIP_RUN_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.run_timeout_secs
            );
        }

        if self.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!(
                "FASTIP_LISTEN_ADDR must be an address like 0.0.0.0:8080. Got: {}",
                self.listen_addr
            );
        }

        if !self.doh_url.starts_with("https://") && !self.doh_url.starts_with("http://") {
            anyhow::bail!(
                "FASTIP_DOH_URL must use HTTP or HTTPS scheme. Got: {}",
                self.doh_url
            );
        }

        self.log_level()?;
        self.sync_config().validate()?;

        Ok(())
    }

    /// Parsed `FASTIP_LOG_LEVEL`
    pub fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "FASTIP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Core job configuration
    pub fn sync_config(&self) -> SyncConfig {
        let mut endpoint = EndpointConfig::with_host(self.dns_endpoint.clone());
        endpoint.region = self.region.clone();
        endpoint.project_id = self.project_id.clone();

        let mut config = SyncConfig::new(
            self.source_domain.clone(),
            self.target_domain.clone(),
            ProviderConfig::HuaweiCloud {
                credential: Credential::new(self.access_key.clone(), self.secret_key.clone()),
                endpoint,
                dry_run: self.dry_run,
            },
        );
        config.schedule = ScheduleConfig {
            interval_secs: self.interval_secs,
            run_timeout_secs: self.run_timeout_secs,
        };
        config
    }
}

fn parse_secs(value: Option<String>, name: &str, default: u64) -> Result<u64> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds. Got: {}", name, v)),
    }
}
