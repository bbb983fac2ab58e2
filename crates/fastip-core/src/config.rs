//! Configuration types for fastip-sync
//!
//! This module defines all configuration structures used throughout the workspace.

use serde::{Deserialize, Serialize};

/// Default Huawei Cloud DNS API host
pub const DEFAULT_DNS_ENDPOINT: &str = "dns.myhuaweicloud.com";

/// Default signing region
pub const DEFAULT_REGION: &str = "cn-north-4";

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Domain whose A records are the desired addresses
    pub source_domain: String,

    /// Domain whose A record is kept in sync
    pub target_domain: String,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Schedule settings
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl SyncConfig {
    /// Create a new configuration with default schedule
    pub fn new(
        source_domain: impl Into<String>,
        target_domain: impl Into<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            source_domain: source_domain.into(),
            target_domain: target_domain.into(),
            provider,
            schedule: ScheduleConfig::default(),
        }
    }

    /// Validate the configuration
    ///
    /// Runs before any network call is made.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;

        validate_domain_name(&self.source_domain)
            .map_err(|e| crate::Error::config(format!("source domain: {}", e)))?;
        validate_domain_name(&self.target_domain)
            .map_err(|e| crate::Error::config(format!("target domain: {}", e)))?;

        if !self.target_domain.trim_end_matches('.').contains('.') {
            return Err(crate::Error::config(format!(
                "target domain '{}' has no parent zone",
                self.target_domain
            )));
        }

        self.schedule.validate()?;

        Ok(())
    }
}

/// Access key pair used to sign provider requests
///
/// The secret never leaves this process; only signatures derived from it are sent.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Access key identifier
    pub access_key: String,
    /// Secret key
    pub secret_key: String,
}

impl Credential {
    /// Create a new credential
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Fail if either half of the key pair is empty
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.access_key.trim().is_empty() {
            return Err(crate::Error::config("access key cannot be empty"));
        }
        if self.secret_key.trim().is_empty() {
            return Err(crate::Error::config("secret key cannot be empty"));
        }
        Ok(())
    }
}

// The secret key must never show up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

/// Provider API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// API host, e.g. "dns.myhuaweicloud.com"
    #[serde(default = "default_endpoint")]
    pub host: String,

    /// Project (tenant) identifier, sent and signed when present
    #[serde(default)]
    pub project_id: Option<String>,

    /// Region used in the signing scope
    #[serde(default = "default_region")]
    pub region: String,
}

impl EndpointConfig {
    /// Endpoint with an explicit host and default region
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the project identifier
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_endpoint(),
            project_id: None,
            region: default_region(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_DNS_ENDPOINT.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Huawei Cloud DNS
    HuaweiCloud {
        /// Signing credential
        credential: Credential,
        /// API endpoint
        #[serde(default)]
        endpoint: EndpointConfig,
        /// Log intended writes instead of performing them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Huawei Cloud provider in live mode
    pub fn huawei_cloud(credential: Credential, endpoint: EndpointConfig) -> Self {
        ProviderConfig::HuaweiCloud {
            credential,
            endpoint,
            dry_run: false,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::HuaweiCloud {
                credential,
                endpoint,
                ..
            } => {
                credential.validate()?;
                if endpoint.host.trim().is_empty() {
                    return Err(crate::Error::config("DNS endpoint host cannot be empty"));
                }
                if endpoint.region.trim().is_empty() {
                    return Err(crate::Error::config("signing region cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

/// Schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Interval between scheduled runs (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Deadline for a single run (in seconds)
    ///
    /// When it expires in-flight requests are dropped and the run fails.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl ScheduleConfig {
    /// Validate the schedule
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("schedule interval must be > 0"));
        }
        if self.run_timeout_secs == 0 {
            return Err(crate::Error::config("run timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_run_timeout_secs() -> u64 {
    30
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; a single trailing dot is accepted.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(crate::Error::invalid_input("domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::invalid_input(format!(
            "domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::invalid_input(format!(
                "domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::invalid_input(format!(
                "domain label too long: {} chars (max 63)",
                label.len()
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::Error::invalid_input(format!(
                "domain label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::invalid_input(format!(
                "domain label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(key: &str, secret: &str) -> ProviderConfig {
        ProviderConfig::huawei_cloud(Credential::new(key, secret), EndpointConfig::default())
    }

    #[test]
    fn test_valid_config() {
        let config = SyncConfig::new("zecrimp.top", "cf.hw.072103.xyz", provider("ak", "sk"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = SyncConfig::new("zecrimp.top", "cf.hw.072103.xyz", provider("", "sk"));
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));

        let config = SyncConfig::new("zecrimp.top", "cf.hw.072103.xyz", provider("ak", "  "));
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_target_needs_parent_zone() {
        let config = SyncConfig::new("zecrimp.top", "localhost", provider("ak", "sk"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = SyncConfig::new("zecrimp.top", "cf.hw.072103.xyz", provider("ak", "sk"));
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_defaults() {
        let endpoint = EndpointConfig::default();
        assert_eq!(endpoint.host, DEFAULT_DNS_ENDPOINT);
        assert_eq!(endpoint.region, DEFAULT_REGION);
        assert!(endpoint.project_id.is_none());

        let endpoint: EndpointConfig = serde_json::from_str(r#"{"project_id":"p1"}"#).unwrap();
        assert_eq!(endpoint.host, DEFAULT_DNS_ENDPOINT);
        assert_eq!(endpoint.project_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::new("AKID", "super-secret-value");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain_name("cf.hw.072103.xyz").is_ok());
        assert!(validate_domain_name("cf.hw.072103.xyz.").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("a..b").is_err());
        assert!(validate_domain_name("-a.b").is_err());
        assert!(validate_domain_name("a b.c").is_err());
        assert!(validate_domain_name(&"a".repeat(64)).is_err());
    }
}
