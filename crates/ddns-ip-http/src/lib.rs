// # HTTP IP Source
//
// Discovers the host's public address by asking external echo services.
//
// ## Architecture
//
// Each address family has a fixed, ordered list of services and its own
// reqwest client. The client binds its outbound socket to the unspecified
// address of the family (`0.0.0.0` or `::`), so only destinations of that
// family are dialed and a working IPv4 stack cannot answer an IPv6 query.
//
// Services are tried in order. An unreachable service, a non-2xx status or
// a body that is not an IP literal skips to the next one. The first valid
// address is checked against the requested family; a mismatch is reported
// as a service bug rather than skipped.

use ddns_core::traits::IpSource;
use ddns_core::{Error, IpFamily, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Overall and connect timeout for a single service request
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default IPv4 echo services as `(name, url)`, in query order
pub const IPV4_SERVICES: &[(&str, &str)] = &[
    ("ipify API", "https://api.ipify.org"),
    ("AWS check ip", "https://checkip.amazonaws.com/"),
    ("major.io icanhazip", "https://ipv4.icanhazip.com/"),
    ("Namecheap DynamicDNS", "https://dynamicdns.park-your-domain.com/getip"),
];

/// Default IPv6 echo services as `(name, url)`, in query order
pub const IPV6_SERVICES: &[(&str, &str)] = &[
    ("ipify API", "https://api6.ipify.org"),
    ("ip.tyk.nu", "https://ip.tyk.nu/"),
    ("wgetip.com", "https://wgetip.com/"),
    ("major.io icanhazip", "https://ipv6.icanhazip.com/"),
];

/// An echo service answering with the caller's address as plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpService {
    /// Display name for log messages
    pub name: String,
    pub url: String,
}

impl IpService {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    fn from_table(table: &[(&str, &str)]) -> Vec<Self> {
        table.iter().map(|(name, url)| Self::new(*name, *url)).collect()
    }
}

/// Services and transport for one address family
struct FamilyResolver {
    services: Vec<IpService>,
    client: reqwest::Client,
}

/// HTTP-based IP source
pub struct HttpIpSource {
    v4: FamilyResolver,
    v6: FamilyResolver,
}

impl HttpIpSource {
    /// Create a source using the built-in service lists
    pub fn new() -> Result<Self> {
        Self::with_services(
            IpService::from_table(IPV4_SERVICES),
            IpService::from_table(IPV6_SERVICES),
        )
    }

    /// Create a source with custom service lists
    pub fn with_services(v4_services: Vec<IpService>, v6_services: Vec<IpService>) -> Result<Self> {
        Ok(Self {
            v4: FamilyResolver {
                services: v4_services,
                client: build_client(Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))?,
            },
            v6: FamilyResolver {
                services: v6_services,
                client: build_client(Some(IpAddr::V6(Ipv6Addr::UNSPECIFIED)))?,
            },
        })
    }

    /// Source whose clients are not bound to a family, so loopback mock
    /// servers are reachable for both lists
    #[cfg(test)]
    fn unpinned(v4_services: Vec<IpService>, v6_services: Vec<IpService>) -> Result<Self> {
        Ok(Self {
            v4: FamilyResolver {
                services: v4_services,
                client: build_client(None)?,
            },
            v6: FamilyResolver {
                services: v6_services,
                client: build_client(None)?,
            },
        })
    }

    fn resolver(&self, family: IpFamily) -> &FamilyResolver {
        match family {
            IpFamily::V4 => &self.v4,
            IpFamily::V6 => &self.v6,
        }
    }

    /// First address any service of the family answers with
    async fn fetch_ip(&self, family: IpFamily) -> Result<IpAddr> {
        let resolver = self.resolver(family);

        for service in &resolver.services {
            let url = &service.url;
            info!(
                "Checking current {} address with service: {} ({})",
                family, service.name, url
            );

            let response = match resolver.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!("Request to {} failed: {}", url, e);
                    info!("Service {} unreachable, skipping.", service.name);
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                info!("Service returned error status: {}, skipping.", status.as_u16());
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    info!("Failed to read response from {}: {}, skipping.", url, e);
                    continue;
                }
            };

            let text = body.trim();
            match text.parse::<IpAddr>() {
                Ok(ip) => {
                    info!("Current IP address: {}", ip);
                    return Ok(ip);
                }
                Err(_) => {
                    warn!("Service returned invalid IP Address: {}, skipping.", text);
                }
            }
        }

        Err(Error::ip_unavailable(
            "Tried all IP Services, but couldn't determine current IP address.",
        ))
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, family: IpFamily) -> Result<IpAddr> {
        let ip = self.fetch_ip(family).await?;
        check_family(family, ip)
    }
}

/// Build a client bound to `local_address`
fn build_client(local_address: Option<IpAddr>) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .local_address(local_address)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))
}

/// Reject answers of the wrong family
///
/// An IPv4-mapped IPv6 answer to an IPv4 query is returned in its plain
/// IPv4 form. Any answer to an IPv6 query that is expressible as IPv4 is
/// rejected.
pub fn check_family(family: IpFamily, ip: IpAddr) -> Result<IpAddr> {
    let canonical = ip.to_canonical();

    match (family, canonical) {
        (IpFamily::V4, IpAddr::V4(_)) => Ok(canonical),
        (IpFamily::V4, IpAddr::V6(_)) => Err(Error::ip_unavailable(
            "IP Service returned IPv6 address instead of IPv4. There is a bug with the IP Service.",
        )),
        (IpFamily::V6, IpAddr::V6(_)) => Ok(ip),
        (IpFamily::V6, IpAddr::V4(_)) => Err(Error::ip_unavailable(format!(
            "IP Service returned IPv4 address {} instead of IPv6. You either don't have an \
             IPv6 address, or there is a bug with the IP Service.",
            ip
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_creation() {
        assert!(HttpIpSource::new().is_ok());
    }

    #[test]
    fn test_default_service_lists() {
        assert_eq!(IPV4_SERVICES.len(), 4);
        assert_eq!(IPV6_SERVICES.len(), 4);
        assert!(
            IPV4_SERVICES
                .iter()
                .chain(IPV6_SERVICES)
                .all(|(name, url)| !name.is_empty() && url.starts_with("https://"))
        );

        let v4 = IpService::from_table(IPV4_SERVICES);
        assert_eq!(v4[0], IpService::new("ipify API", "https://api.ipify.org"));
    }

    #[test]
    fn test_check_family_accepts_matching_family() {
        let v4: IpAddr = "192.0.2.1".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert_eq!(check_family(IpFamily::V4, v4).unwrap(), v4);
        assert_eq!(check_family(IpFamily::V6, v6).unwrap(), v6);
    }

    #[test]
    fn test_check_family_unmaps_v4_mapped_for_v4_query() {
        let mapped: IpAddr = "::ffff:192.0.2.1".parse().unwrap();
        assert_eq!(
            check_family(IpFamily::V4, mapped).unwrap(),
            "192.0.2.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_check_family_rejects_v4_for_v6_query() {
        let plain: IpAddr = "93.184.216.34".parse().unwrap();
        let mapped: IpAddr = "::ffff:93.184.216.34".parse().unwrap();

        for ip in [plain, mapped] {
            let err = check_family(IpFamily::V6, ip).unwrap_err();
            assert!(matches!(err, Error::IpUnavailable(_)));
            assert!(err.to_string().contains("instead of IPv6"));
        }
    }

    #[test]
    fn test_check_family_rejects_v6_for_v4_query() {
        let err = check_family(IpFamily::V4, "2001:db8::1".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::IpUnavailable(_)));
        assert!(err.to_string().contains("instead of IPv4"));
    }
}
