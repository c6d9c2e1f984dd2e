// # Cloudflare DNS Provider
//
// DnsProvider implementation for the Cloudflare v4 REST API.
//
// ## Behaviour
//
// - Every call is single-shot: no retries, no backoff
// - The zone list is fetched once per provider instance and memoized
// - Zone lookup is a suffix match over the memoized list (the API has no
//   suffix search)
// - Deleting an absent record succeeds
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify Token: GET `/user/tokens/verify`
// - List Zones: GET `/zones`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::traits::{DnsProvider, DnsRecord, Zone};
use ddns_core::{Error, RecordType, Result};
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "cloudflare";

/// Response wrapper used by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Deserialize)]
struct RecordId {
    id: String,
}

fn join_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(ApiError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Cloudflare DNS provider
///
/// One instance is meant to live for one reconciliation pass; the zone list
/// it memoizes is never refreshed.
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Every zone visible to the token, fetched on first use
    zones: OnceCell<Vec<Zone>>,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("zones", &self.zones.get())
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// `api_token` needs Zone:Read and DNS:Edit permissions. Fails with
    /// [`Error::Config`] when the token is empty.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_token, CLOUDFLARE_API_BASE)
    }

    /// Create a provider talking to a custom API root
    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .connect_timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            zones: OnceCell::new(),
        })
    }

    fn request_builder(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Cloudflare API request: {} {}", method, path);

        self.client
            .request(method, &url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
    }

    /// Send an API request and unwrap the `result` of the response envelope
    ///
    /// - 4xx: provider error hinting at the token
    /// - Non-empty `errors`: provider error listing them
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T> {
        let mut request = self.request_builder(method, path);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("Failed to read response: {}", e))
        })?;
        debug!("Cloudflare API response ({}): {}", status, text);

        let envelope: Option<Envelope<T>> = serde_json::from_str(&text).ok();

        if status.is_client_error() {
            let detail = match &envelope {
                Some(envelope) if !envelope.errors.is_empty() => join_errors(&envelope.errors),
                _ => text.clone(),
            };
            error!(
                "CloudFlare API Client error: {}. Maybe your API token is invalid?",
                detail
            );
            return Err(Error::provider(
                PROVIDER_NAME,
                format!(
                    "Client error ({}): {}. Maybe your API token is invalid?",
                    status, detail
                ),
            ));
        }

        let envelope = envelope.ok_or_else(|| {
            Error::provider(
                PROVIDER_NAME,
                format!("Unexpected response ({}): {}", status, text),
            )
        })?;

        if !envelope.errors.is_empty() {
            let detail = join_errors(&envelope.errors);
            error!("CloudFlare API error: {}", detail);
            return Err(Error::provider(PROVIDER_NAME, format!("API error: {}", detail)));
        }

        if !status.is_success() {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("API returned status {}", status),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "Invalid response format: missing result")
        })
    }

    async fn fetch_zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<Zone> = self.request(Method::GET, "/zones", &[], None).await?;
        debug!("Fetched {} zones", zones.len());
        Ok(zones)
    }

    async fn zone_id_for(&self, domain: &str, zone_id: Option<&str>) -> Result<String> {
        match zone_id {
            Some(zone_id) => Ok(zone_id.to_string()),
            None => self.resolve_zone(domain).await,
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn verify_token(&self) -> Result<()> {
        let response = self
            .request_builder(Method::GET, "/user/tokens/verify")
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(Error::token_invalid("Invalid API token"));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<Envelope<Value>>(&text) {
                Ok(envelope) if !envelope.errors.is_empty() => join_errors(&envelope.errors),
                _ => text,
            };
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("Token verification failed ({}): {}", status, detail),
            ));
        }

        Ok(())
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.zones
            .get_or_try_init(|| self.fetch_zones())
            .await
            .cloned()
    }

    async fn resolve_record(&self, domain: &str, record_type: RecordType) -> Result<String> {
        let zone_id = self.resolve_zone(domain).await?;

        let records: Vec<DnsRecord> = self
            .request(
                Method::GET,
                &format!("/zones/{}/dns_records", zone_id),
                &[("name", domain)],
                None,
            )
            .await?;

        match records
            .iter()
            .find(|record| record.record_type == record_type.as_str() && record.name == domain)
        {
            Some(record) => {
                debug!("Found {} record {} for {}", record_type, record.id, domain);
                Ok(record.id.clone())
            }
            None => {
                info!("Failed to get domain records for \"{}\"", domain);
                Err(Error::record_not_found(domain, record_type))
            }
        }
    }

    async fn create_record(&self, domain: &str, ip: IpAddr, proxied: bool) -> Result<String> {
        let zone_id = self.resolve_zone(domain).await?;
        let record_type = RecordType::for_ip(ip);
        info!("Creating a new {} record for \"{}\".", record_type, domain);

        let payload = json!({
            "name": domain,
            "type": record_type.as_str(),
            "content": ip.to_canonical().to_string(),
            "ttl": 1,
            "proxied": proxied,
        });

        let record: RecordId = self
            .request(
                Method::POST,
                &format!("/zones/{}/dns_records", zone_id),
                &[],
                Some(&payload),
            )
            .await
            .inspect_err(|e| error!("Failed to create new record for \"{}\": {}", domain, e))?;

        Ok(record.id)
    }

    async fn update_record(
        &self,
        domain: &str,
        ip: IpAddr,
        zone_id: Option<&str>,
        record_id: Option<&str>,
        proxied: bool,
    ) -> Result<()> {
        let zone_id = self.zone_id_for(domain, zone_id).await?;
        let record_type = RecordType::for_ip(ip);
        let record_id = match record_id {
            Some(record_id) => record_id.to_string(),
            None => self.resolve_record(domain, record_type).await?,
        };
        info!("Updating \"{}\" {} record.", domain, record_type);

        let payload = json!({
            "name": domain,
            "type": record_type.as_str(),
            "content": ip.to_canonical().to_string(),
            "proxied": proxied,
        });

        let _: Value = self
            .request(
                Method::PUT,
                &format!("/zones/{}/dns_records/{}", zone_id, record_id),
                &[],
                Some(&payload),
            )
            .await
            .inspect_err(|e| error!("Failed to update domain \"{}\": {}", domain, e))?;

        Ok(())
    }

    async fn delete_record(&self, domain: &str, record_type: RecordType) -> Result<()> {
        warn!("Deleting {} record for \"{}\".", record_type, domain);
        let zone_id = self.resolve_zone(domain).await?;

        let record_id = match self.resolve_record(domain, record_type).await {
            Ok(record_id) => record_id,
            Err(e) if e.is_record_not_found() => {
                info!("{} record for \"{}\" doesn't exist.", record_type, domain);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let _: Value = self
            .request(
                Method::DELETE,
                &format!("/zones/{}/dns_records/{}", zone_id, record_id),
                &[],
                None,
            )
            .await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            CloudflareProvider::new(""),
            Err(Error::Config(_))
        ));
        assert!(CloudflareProvider::new("  ").is_err());
    }

    #[test]
    fn test_provider_name() {
        let provider = CloudflareProvider::new("token").unwrap();
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = CloudflareProvider::new("secret_token_12345").unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareProvider"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = CloudflareProvider::with_base_url("token", "http://localhost:1/v4/").unwrap();
        assert_eq!(provider.base_url, "http://localhost:1/v4");
    }

    #[test]
    fn test_envelope_errors_joined() {
        let envelope: Envelope<Value> = serde_json::from_value(json!({
            "result": null,
            "success": false,
            "errors": [
                {"code": 1003, "message": "Invalid or missing zone id."},
                {"code": 7003, "message": "Could not route to /zones/x"}
            ]
        }))
        .unwrap();

        assert!(envelope.result.is_none());
        assert_eq!(
            join_errors(&envelope.errors),
            "1003: Invalid or missing zone id.; 7003: Could not route to /zones/x"
        );
    }
}
