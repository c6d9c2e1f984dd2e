// # DNS Provider Trait
//
// Defines the interface for managing address records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.resolve_zone("www.example.com").await?;
//     provider
//         .update_record(
//             "www.example.com",
//             std::net::IpAddr::from([192, 0, 2, 1]),
//             Some(&zone_id),
//             None,
//             false,
//         )
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::error::Error;
use crate::types::RecordType;

/// A provider-side zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

impl Zone {
    /// Whether `domain` lives in this zone: it is the apex or ends with
    /// `.<zone name>`.
    pub fn contains(&self, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.');
        let zone = self.name.trim_end_matches('.');

        let Some(split) = domain.len().checked_sub(zone.len()) else {
            return false;
        };
        if !domain.is_char_boundary(split) {
            return false;
        }

        let (head, tail) = domain.split_at(split);
        tail.eq_ignore_ascii_case(zone) && (head.is_empty() || head.ends_with('.'))
    }
}

/// A provider-side DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub ttl: u32,
}

/// Trait for DNS provider implementations
///
/// Every operation is a single-shot API interaction; the provider does not
/// retry and does not decide whether an update is needed. The orchestrator
/// in [`crate::DdnsEngine`] drives the resolve/create/update ladder.
///
/// The zone list is the one piece of state a provider keeps: it is fetched
/// on first use and memoized for the lifetime of the instance, so a fresh
/// instance per run sees a fresh list.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that the API token is accepted
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Token is valid
    /// - `Err(Error::TokenInvalid)`: Provider rejected the token
    /// - `Err(Error::Provider)`: Any other failure
    async fn verify_token(&self) -> Result<(), Error>;

    /// List every zone visible to the token (memoized per instance)
    async fn list_zones(&self) -> Result<Vec<Zone>, Error>;

    /// Find the zone containing `domain`
    ///
    /// The first listed zone whose name is a label-boundary suffix of the
    /// domain wins; overlapping zones are not disambiguated.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone id
    /// - `Err(Error::DomainNotFound)`: No zone contains the domain
    async fn resolve_zone(&self, domain: &str) -> Result<String, Error> {
        let zones = self.list_zones().await?;

        match zones.iter().find(|zone| zone.contains(domain)) {
            Some(zone) => Ok(zone.id.clone()),
            None => {
                tracing::error!("Cannot find domain \"{}\" at {}", domain, self.provider_name());
                Err(Error::domain_not_found(domain))
            }
        }
    }

    /// Find the record id of the `record_type` record named exactly `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The record id
    /// - `Err(Error::RecordNotFound)`: No such record (caller may create it)
    async fn resolve_record(&self, domain: &str, record_type: RecordType) -> Result<String, Error>;

    /// Create an address record with automatic TTL; the type follows the
    /// address. Returns the new record id.
    async fn create_record(&self, domain: &str, ip: IpAddr, proxied: bool)
    -> Result<String, Error>;

    /// Point an existing address record at `ip`
    ///
    /// Missing `zone_id` / `record_id` are resolved first.
    async fn update_record(
        &self,
        domain: &str,
        ip: IpAddr,
        zone_id: Option<&str>,
        record_id: Option<&str>,
        proxied: bool,
    ) -> Result<(), Error>;

    /// Delete the `record_type` record of `domain`
    ///
    /// A record that is already absent counts as deleted.
    async fn delete_record(&self, domain: &str, record_type: RecordType) -> Result<(), Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str) -> Zone {
        Zone {
            id: format!("id-{}", name),
            name: name.to_string(),
        }
    }

    #[test]
    fn zone_contains_apex_and_subdomains() {
        let zone = zone("example.com");
        assert!(zone.contains("example.com"));
        assert!(zone.contains("www.example.com"));
        assert!(zone.contains("*.example.com"));
        assert!(zone.contains("deep.sub.Example.COM"));
    }

    #[test]
    fn zone_does_not_match_across_label_boundary() {
        let zone = zone("example.com");
        assert!(!zone.contains("notexample.com"));
        assert!(!zone.contains("example.org"));
        assert!(!zone.contains("com"));
    }

    #[test]
    fn dns_record_deserializes_provider_shape() {
        let record: DnsRecord = serde_json::from_value(serde_json::json!({
            "id": "rec1",
            "type": "AAAA",
            "name": "www.example.com",
            "content": "2001:db8::1",
            "proxied": true,
            "ttl": 1,
            "zone_id": "ignored"
        }))
        .unwrap();

        assert_eq!(record.record_type, "AAAA");
        assert!(record.proxied);
        assert_eq!(record.ttl, 1);
    }
}
