//! SDK-HMAC-SHA256 request signing
//!
//! Signing is a pure function of the credential, region, request parts and
//! timestamp. Nothing here touches the network or the clock, so the same
//! inputs always produce the same headers.
//!
//! ```text
//! canonical request = METHOD \n PATH \n QUERY \n HEADERS \n SIGNED-HEADERS \n hex(sha256(body))
//! scope             = YYYYMMDD / region / dns / sdk_request
//! string to sign    = SDK-HMAC-SHA256 \n YYYYMMDDTHHMMSSZ \n scope \n hex(sha256(canonical request))
//! signing key       = HMAC(HMAC(HMAC(HMAC("SDK" + secret, YYYYMMDD), region), "dns"), "sdk_request")
//! signature         = hex(HMAC(signing key, string to sign))
//! ```

use chrono::{DateTime, Utc};
use fastip_core::config::Credential;
use fastip_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name, first token of the Authorization header
pub const ALGORITHM: &str = "SDK-HMAC-SHA256";

/// Service component of the credential scope
pub const SERVICE: &str = "dns";

/// Terminator of the credential scope
pub const SCOPE_TERMINATOR: &str = "sdk_request";

/// Request timestamp header
pub const HEADER_DATE: &str = "X-Sdk-Date";

/// Body digest header
pub const HEADER_CONTENT_SHA256: &str = "X-Sdk-Content-Sha256";

/// Project scoping header
pub const HEADER_PROJECT_ID: &str = "X-Project-Id";

/// The parts of an HTTP request that are covered by the signature
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    /// HTTP method, e.g. "GET"
    pub method: &'a str,
    /// Host header value (host or host:port)
    pub host: &'a str,
    /// Request path without query, e.g. "/v2/zones"
    pub path: &'a str,
    /// Unencoded query parameters
    pub query: &'a [(&'a str, &'a str)],
    /// Additional headers to sign, besides host and the timestamp
    pub headers: &'a [(&'a str, &'a str)],
    /// Raw request body (empty for GET)
    pub body: &'a [u8],
}

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value for `X-Sdk-Date`
    pub date: String,
    /// Value for `X-Sdk-Content-Sha256`
    pub content_sha256: String,
    /// Value for `Authorization`
    pub authorization: String,
}

impl SignedHeaders {
    /// Header name/value pairs in the order they are sent
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_DATE, self.date.as_str()),
            (HEADER_CONTENT_SHA256, self.content_sha256.as_str()),
            ("Authorization", self.authorization.as_str()),
        ]
    }
}

/// Sign a request
///
/// # Errors
///
/// Returns a configuration error if either half of the credential is empty.
pub fn sign(
    credential: &Credential,
    region: &str,
    request: &SigningRequest<'_>,
    now: DateTime<Utc>,
) -> Result<SignedHeaders> {
    credential.validate()?;

    let date_stamp = now.format("%Y%m%d").to_string();
    let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    let content_sha256 = hex::encode(Sha256::digest(request.body));

    let (canonical_headers, signed_headers) =
        canonical_headers(request.host, &timestamp, request.headers);

    let canonical = canonical_request(
        request.method,
        &canonical_path(request.path),
        &canonical_query(request.query),
        &canonical_headers,
        &signed_headers,
        &content_sha256,
    );

    let scope = credential_scope(&date_stamp, region);
    let to_sign = string_to_sign(&timestamp, &scope, &canonical);

    let key = signing_key(&credential.secret_key, &date_stamp, region)?;
    let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes())?);

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credential.access_key, scope, signed_headers, signature
    );

    Ok(SignedHeaders {
        date: timestamp,
        content_sha256,
        authorization,
    })
}

/// Percent-encode each path segment and make sure the path both starts and
/// ends with `/`
pub fn canonical_path(path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();

    if encoded.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", encoded.join("/"))
    }
}

/// RFC 3986 encode and sort query parameters by key, then value
///
/// The same string is used on the wire, so the signed query always matches
/// the sent one.
pub fn canonical_query(query: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical header block and the signed header list
///
/// `host` and the timestamp are always signed. Names are lower-cased, values
/// trimmed, and entries sorted by name.
fn canonical_headers(host: &str, timestamp: &str, extra: &[(&str, &str)]) -> (String, String) {
    let mut headers: Vec<(String, String)> = vec![
        ("host".to_string(), host.trim().to_string()),
        (HEADER_DATE.to_lowercase(), timestamp.to_string()),
    ];
    headers.extend(
        extra
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value.trim().to_string())),
    );
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let block: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    (block, signed)
}

fn canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &str,
    signed_headers: &str,
    content_sha256: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        path,
        query,
        headers,
        signed_headers,
        content_sha256
    )
}

fn credential_scope(date_stamp: &str, region: &str) -> String {
    format!("{}/{}/{}/{}", date_stamp, region, SERVICE, SCOPE_TERMINATOR)
}

fn string_to_sign(timestamp: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    )
}

fn signing_key(secret_key: &str, date_stamp: &str, region: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("SDK{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::config(format!("invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
