// # Reconciliation Cache
//
// The cache remembers, per address family, the last address pushed to the
// provider and the provider-side coordinates of every domain pushed under
// it. A run diffs the requested domains against it to decide which domains
// need a provider call at all.
//
// ## File Format
//
// ```json
// {
//   "ipv4": {
//     "address": "192.0.2.1",
//     "updated_domains": {
//       "example.com": { "zone_id": "z1", "record_id": "r1", "proxied": false }
//     }
//   },
//   "ipv6": { "updated_domains": {} }
// }
// ```
//
// A missing `address` means no address is known for the family.

pub mod file;
pub mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::types::IpFamily;

/// Provider-side coordinates of a record pushed in a previous run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub zone_id: String,
    pub record_id: String,
    #[serde(default)]
    pub proxied: bool,
}

/// Cache for one address family
///
/// A domain is listed in `updated_domains` only if a create/update for it
/// succeeded under the stored `address`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCache {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddr>,
    #[serde(default)]
    pub updated_domains: BTreeMap<String, ZoneRecord>,
}

impl IpCache {
    /// Cache holding only an address, no domains yet
    pub fn with_address(address: IpAddr) -> Self {
        Self {
            address: Some(address),
            updated_domains: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.updated_domains.is_empty()
    }

    /// Whether `ip` is the address stored in this cache
    pub fn is_current(&self, ip: IpAddr) -> bool {
        self.address == Some(ip)
    }

    /// Domains already pushed under the stored address with the requested
    /// proxy setting
    pub fn up_to_date_domains(&self, proxied: bool) -> Vec<&str> {
        self.updated_domains
            .iter()
            .filter(|(_, record)| record.proxied == proxied)
            .map(|(domain, _)| domain.as_str())
            .collect()
    }

    /// Requested domains that need a provider call, in requested order
    ///
    /// When `current_ip` differs from the stored address every requested
    /// domain is returned. Otherwise only domains that are missing from the
    /// cache or were pushed with a different proxy setting are returned.
    pub fn domains_to_update(
        &self,
        requested: &[String],
        current_ip: IpAddr,
        proxied: bool,
    ) -> Vec<String> {
        if !self.is_current(current_ip) {
            return requested.to_vec();
        }

        requested
            .iter()
            .filter(|domain| {
                self.updated_domains
                    .get(domain.as_str())
                    .is_none_or(|record| record.proxied != proxied)
            })
            .cloned()
            .collect()
    }
}

/// Cache for both address families
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(default)]
    pub ipv4: IpCache,
    #[serde(default)]
    pub ipv6: IpCache,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    pub fn family(&self, family: IpFamily) -> &IpCache {
        match family {
            IpFamily::V4 => &self.ipv4,
            IpFamily::V6 => &self.ipv6,
        }
    }

    pub fn family_mut(&mut self, family: IpFamily) -> &mut IpCache {
        match family {
            IpFamily::V4 => &mut self.ipv4,
            IpFamily::V6 => &mut self.ipv6,
        }
    }
}
