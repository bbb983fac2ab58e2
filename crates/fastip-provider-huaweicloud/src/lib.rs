// # Huawei Cloud DNS Provider
//
// This crate implements `DnsApi` against the Huawei Cloud DNS v2 API.
//
// ## Behaviour
//
// - One signed HTTP request per trait call
// - Full error propagation, with the provider's response body attached
// - HTTP timeout configured (30 seconds)
// - Status code mapping (401/403, 404, 429, everything else with its body)
// - Dry-run mode: lookups are real, writes are logged and skipped
// - No retries, no caching, no background tasks
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTPS API calls to the configured endpoint only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic (the next scheduled run is the retry)
// - ❌ Decide whether a write is needed (owned by `Reconciler`)
// - ❌ Cache zones or record sets between calls
//
// ## Security Requirements
//
// - The secret key NEVER appears in logs or Debug output
// - Requests are signed with SDK-HMAC-SHA256 (see `signer`)
//
// ## API Reference
//
// - List zones: GET `/v2/zones?type=public&name=<zone>.`
// - List record sets: GET `/v2/zones/{zone_id}/recordsets?name=<fqdn>.&type=A`
// - Create record set: POST `/v2/zones/{zone_id}/recordsets`
// - Update record set: PUT `/v2/zones/{zone_id}/recordsets/{recordset_id}`

pub mod signer;

use async_trait::async_trait;
use chrono::Utc;
use fastip_core::config::{Credential, EndpointConfig, ProviderConfig};
use fastip_core::traits::{DnsApi, DnsApiFactory, RecordSet, RecordSetSpec, Zone, fqdn};
use fastip_core::{Error, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use signer::{HEADER_PROJECT_ID, SigningRequest};
use std::time::Duration;

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "huaweicloud";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ZoneList {
    #[serde(default)]
    zones: Vec<ZoneItem>,
}

#[derive(Debug, Deserialize)]
struct ZoneItem {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordSetList {
    #[serde(default)]
    recordsets: Vec<RecordSetItem>,
}

#[derive(Debug, Deserialize)]
struct RecordSetItem {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    records: Vec<String>,
}

impl From<RecordSetItem> for RecordSet {
    fn from(item: RecordSetItem) -> Self {
        RecordSet {
            id: item.id,
            name: item.name,
            record_type: item.record_type,
            ttl: item.ttl,
            records: item.records,
        }
    }
}

/// Create/update body; `name` carries the trailing dot the API expects
#[derive(Debug, Serialize)]
struct RecordSetBody<'a> {
    name: String,
    #[serde(rename = "type")]
    record_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    records: &'a [String],
}

impl<'a> RecordSetBody<'a> {
    fn from_spec(spec: &'a RecordSetSpec) -> Self {
        Self {
            name: fqdn(&spec.name),
            record_type: &spec.record_type,
            ttl: spec.ttl,
            records: &spec.records,
        }
    }
}

/// Huawei Cloud DNS v2 client
///
/// # Trust Level: Untrusted
///
/// Isolated, stateless and single-shot. Every call re-signs with the current
/// time; nothing survives between calls except the HTTP connection pool.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the client will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended POST/PUT payload
/// - **NOT** modify any record set
pub struct HuaweiCloudDns {
    credential: Credential,
    endpoint: EndpointConfig,

    /// Scheme and authority requests are sent to
    base_url: String,

    /// Host header value covered by the signature (host or host:port)
    host: String,

    client: reqwest::Client,

    dry_run: bool,
}

// Custom Debug implementation that hides the secret key
impl std::fmt::Debug for HuaweiCloudDns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuaweiCloudDns")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("project_id", &self.endpoint.project_id)
            .field("region", &self.endpoint.region)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl HuaweiCloudDns {
    /// Create a new client
    ///
    /// `endpoint.host` is either a bare host (`dns.myhuaweicloud.com`, HTTPS
    /// is implied) or a full base URL such as `http://127.0.0.1:8080`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the credential is incomplete, the
    /// endpoint cannot be parsed, or the HTTP client cannot be built.
    pub fn new(credential: Credential, endpoint: EndpointConfig, dry_run: bool) -> Result<Self> {
        credential.validate()?;

        let (base_url, host) = parse_endpoint(&endpoint.host)?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credential,
            endpoint,
            base_url,
            host,
            client,
            dry_run,
        })
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let query = signer::canonical_query(query);
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        }
    }

    /// Sign and send one request, returning the body of a 2xx response
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<String> {
        let body = body.unwrap_or_default();

        let mut extra_headers: Vec<(&str, &str)> = Vec::new();
        if let Some(project_id) = self.endpoint.project_id.as_deref() {
            extra_headers.push((HEADER_PROJECT_ID, project_id));
        }

        let signed = signer::sign(
            &self.credential,
            &self.endpoint.region,
            &SigningRequest {
                method: method.as_str(),
                host: &self.host,
                path,
                query,
                headers: &extra_headers,
                body: &body,
            },
            Utc::now(),
        )?;

        let mut request = self.client.request(method.clone(), self.url(path, query));
        for (name, value) in signed.pairs() {
            request = request.header(name, value);
        }
        for (name, value) in &extra_headers {
            request = request.header(*name, *value);
        }
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        tracing::debug!("{} {} {}", PROVIDER_NAME, method, path);

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(map_status(status.as_u16(), text, &format!("{} {}", method, path)));
        }

        response
            .text()
            .await
            .map_err(|e| Error::http(format!("{} {} body read failed: {}", method, path, e)))
    }
}

/// Split the configured endpoint into the base URL and the signed host value
fn parse_endpoint(endpoint: &str) -> Result<(String, String)> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let url = reqwest::Url::parse(&with_scheme)
        .map_err(|e| Error::config(format!("invalid DNS endpoint '{}': {}", endpoint, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::config(format!("DNS endpoint '{}' has no host", endpoint)))?;

    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok((format!("{}://{}", url.scheme(), authority), authority))
}

/// Map a non-success status to an error, always keeping the response body
fn map_status(status: u16, body: String, request: &str) -> Error {
    match status {
        401 | 403 => Error::Authentication { status, body },
        404 => {
            tracing::warn!("{} returned 404 for {}", PROVIDER_NAME, request);
            Error::not_found(status, body)
        }
        429 => Error::RateLimited { status, body },
        500..=599 => {
            tracing::warn!("{} server error (transient): {} on {}", PROVIDER_NAME, status, request);
            Error::api(PROVIDER_NAME, status, body)
        }
        _ => Error::api(PROVIDER_NAME, status, body),
    }
}

#[async_trait]
impl DnsApi for HuaweiCloudDns {
    async fn list_zones(&self, name: &str) -> Result<Vec<Zone>> {
        let name = fqdn(name);
        let body = self
            .send(
                Method::GET,
                "/v2/zones",
                &[("type", "public"), ("name", name.as_str())],
                None,
            )
            .await?;

        let list: ZoneList = serde_json::from_str(&body)?;
        tracing::debug!("{} zone(s) matched {}", list.zones.len(), name);

        Ok(list
            .zones
            .into_iter()
            .map(|z| Zone {
                id: z.id,
                name: z.name,
            })
            .collect())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<RecordSet>> {
        let name = fqdn(name);
        let path = format!("/v2/zones/{}/recordsets", zone_id);
        let body = self
            .send(
                Method::GET,
                &path,
                &[("name", name.as_str()), ("type", record_type)],
                None,
            )
            .await?;

        let list: RecordSetList = serde_json::from_str(&body)?;
        Ok(list.recordsets.into_iter().map(RecordSet::from).collect())
    }

    async fn create_record_set(&self, zone_id: &str, spec: &RecordSetSpec) -> Result<RecordSet> {
        let path = format!("/v2/zones/{}/recordsets", zone_id);
        let payload = serde_json::to_vec(&RecordSetBody::from_spec(spec))?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST {} with payload: {}",
                self.url(&path, &[]),
                String::from_utf8_lossy(&payload)
            );
            return Ok(RecordSet {
                id: "dry-run".to_string(),
                name: fqdn(&spec.name),
                record_type: spec.record_type.clone(),
                ttl: spec.ttl,
                records: spec.records.clone(),
            });
        }

        let body = self.send(Method::POST, &path, &[], Some(payload)).await?;
        let created: RecordSetItem = serde_json::from_str(&body)?;

        tracing::info!("Created record set {} ({})", created.name, created.id);
        Ok(created.into())
    }

    async fn update_record_set(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSetSpec,
    ) -> Result<RecordSet> {
        let path = format!("/v2/zones/{}/recordsets/{}", zone_id, record_id);
        let payload = serde_json::to_vec(&RecordSetBody::from_spec(spec))?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT {} with payload: {}",
                self.url(&path, &[]),
                String::from_utf8_lossy(&payload)
            );
            return Ok(RecordSet {
                id: record_id.to_string(),
                name: fqdn(&spec.name),
                record_type: spec.record_type.clone(),
                ttl: spec.ttl,
                records: spec.records.clone(),
            });
        }

        let body = self.send(Method::PUT, &path, &[], Some(payload)).await?;
        let updated: RecordSetItem = serde_json::from_str(&body)?;

        tracing::info!("Updated record set {} ({})", updated.name, updated.id);
        Ok(updated.into())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Huawei Cloud DNS clients
pub struct HuaweiCloudFactory;

impl DnsApiFactory for HuaweiCloudFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsApi>> {
        match config {
            ProviderConfig::HuaweiCloud {
                credential,
                endpoint,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Huawei Cloud provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(HuaweiCloudDns::new(
                    credential.clone(),
                    endpoint.clone(),
                    *dry_run,
                )?))
            }
        }
    }
}
