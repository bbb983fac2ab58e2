// # DNS-over-HTTPS Resolver
//
// This crate provides the `AddressResolver` used to look up the "fast IP"
// source domain.
//
// ## Architecture
//
// One GET per lookup against a DoH JSON endpoint
// (`?name=<domain>&type=A`, `accept: application/dns-json`). Every answer of
// type 1 (A) is collected in response order; CNAME hops and other record
// types in the answer section are ignored.
//
// No caching: every run resolves from scratch so the record always follows
// the source.

use async_trait::async_trait;
use fastip_core::traits::AddressResolver;
use fastip_core::{Error, Result};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Default DoH JSON endpoint
pub const DEFAULT_DOH_URL: &str = "https://cloudflare-dns.com/dns-query";

/// DNS RR type for IPv4 address records
const RR_TYPE_A: u16 = 1;

/// RCODE for "no such domain"
const RCODE_NXDOMAIN: u32 = 3;

/// Timeout for a single lookup
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// Resolver backed by a DNS-over-HTTPS JSON API
#[derive(Debug, Clone)]
pub struct DohResolver {
    /// Endpoint URL, e.g. "https://cloudflare-dns.com/dns-query"
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl DohResolver {
    /// Create a resolver for `url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is empty or the HTTP client
    /// cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::config("DoH URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Resolver for the default public endpoint
    pub fn cloudflare() -> Result<Self> {
        Self::new(DEFAULT_DOH_URL)
    }

    /// The endpoint this resolver queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Pull the IPv4 addresses out of a DoH JSON response
///
/// NXDOMAIN is an empty answer, any other non-zero status is an error.
fn parse_answer(domain: &str, response: DohResponse) -> Result<Vec<Ipv4Addr>> {
    match response.status {
        0 => {}
        RCODE_NXDOMAIN => return Ok(Vec::new()),
        rcode => {
            return Err(Error::resolution(format!(
                "{} lookup failed with rcode {}",
                domain, rcode
            )));
        }
    }

    let mut addresses = Vec::new();
    for answer in response.answer {
        if answer.record_type != RR_TYPE_A {
            continue;
        }
        match answer.data.trim().parse::<Ipv4Addr>() {
            Ok(ip) => addresses.push(ip),
            Err(_) => {
                tracing::warn!("Ignoring malformed A answer for {}: {}", domain, answer.data);
            }
        }
    }

    Ok(addresses)
}

#[async_trait]
impl AddressResolver for DohResolver {
    async fn resolve_addresses(&self, domain: &str) -> Result<Vec<Ipv4Addr>> {
        tracing::debug!("Resolving {} via {}", domain, self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&[("name", domain), ("type", "A")])
            .header(reqwest::header::ACCEPT, "application/dns-json")
            .send()
            .await
            .map_err(|e| Error::resolution(format!("DoH request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::resolution(format!(
                "DoH endpoint returned {}: {}",
                status, body
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::resolution(format!("Failed to read DoH response: {}", e)))?;
        let parsed: DohResponse = serde_json::from_str(&text)
            .map_err(|e| Error::resolution(format!("Invalid DoH response: {}", e)))?;

        let addresses = parse_answer(domain, parsed)?;
        tracing::debug!("{} resolved to {:?}", domain, addresses);
        Ok(addresses)
    }

    fn resolver_name(&self) -> &'static str {
        "doh"
    }
}
