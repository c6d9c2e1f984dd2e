//! Configuration types for the DDNS system
//!
//! A [`DdnsConfig`] describes one reconciliation pass. The binary assembles
//! it from flags and environment variables; the helpers in this module do
//! the input checks that must fail before any network call is made.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::IpFamily;

/// Directory under the user cache dir holding the cache file
const CACHE_DIR_NAME: &str = "cloudflare-dyndns";

/// Cache file name
const CACHE_FILE_NAME: &str = "ip.cache";

/// Settings for one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Domains whose address records are kept in sync, in update order
    pub domains: Vec<String>,

    /// Proxy flag applied to every created/updated record
    #[serde(default)]
    pub proxied: bool,

    /// Reconcile A records
    #[serde(default = "default_ipv4")]
    pub ipv4: bool,

    /// Reconcile AAAA records
    #[serde(default)]
    pub ipv6: bool,

    /// Delete the family's records when no address can be found for it
    #[serde(default)]
    pub delete_missing: bool,

    /// Ignore the cache and push every domain
    #[serde(default)]
    pub force: bool,

    /// Location of the cache file
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Dump cache contents and provider failures
    #[serde(default)]
    pub debug: bool,
}

impl DdnsConfig {
    /// Create a configuration for the given domains with defaults
    /// (IPv4 only, not proxied, default cache path)
    pub fn new(domains: Vec<String>) -> Self {
        Self {
            domains,
            proxied: false,
            ipv4: default_ipv4(),
            ipv6: false,
            delete_missing: false,
            force: false,
            cache_path: default_cache_path(),
            debug: false,
        }
    }

    /// Families enabled for this pass, IPv4 first
    pub fn families(&self) -> Vec<IpFamily> {
        [IpFamily::V4, IpFamily::V6]
            .into_iter()
            .filter(|family| self.is_enabled(*family))
            .collect()
    }

    /// Whether the family is reconciled in this pass
    pub fn is_enabled(&self, family: IpFamily) -> bool {
        match family {
            IpFamily::V4 => self.ipv4,
            IpFamily::V6 => self.ipv6,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.ipv4 && !self.ipv6 {
            return Err(Error::config(
                "You have to specify at least one IP mode; use -4 or -6.",
            ));
        }

        if self.domains.is_empty() {
            return Err(Error::config("No domains to update"));
        }

        for domain in &self.domains {
            validate_domain_name(domain)?;
        }

        Ok(())
    }
}

fn default_ipv4() -> bool {
    true
}

/// Default cache location: `$XDG_CACHE_HOME/cloudflare-dyndns/ip.cache`,
/// then `~/.cache/cloudflare-dyndns/ip.cache`, then `./ip.cache`
pub fn default_cache_path() -> PathBuf {
    let cache_home = std::env::var_os("XDG_CACHE_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")));

    match cache_home {
        Some(dir) => dir.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME),
        None => PathBuf::from(CACHE_FILE_NAME),
    }
}

/// Pick the domain list from either the positional arguments or the
/// whitespace-separated environment value, never both.
pub fn parse_domains(args: Vec<String>, env_value: Option<&str>) -> Result<Vec<String>> {
    let env_value = env_value.map(str::trim).filter(|value| !value.is_empty());

    match (args.is_empty(), env_value) {
        (true, None) => Err(Error::config(
            "You need to specify either domains argument or CLOUDFLARE_DOMAINS environment variable!",
        )),
        (false, Some(_)) => Err(Error::config(
            "Ambiguous domain list, use either argument list or CLOUDFLARE_DOMAINS environment variable, not both!",
        )),
        (true, Some(value)) => Ok(value.split_whitespace().map(str::to_string).collect()),
        (false, None) => Ok(args),
    }
}

/// Resolve the API token from exactly one of the literal value and a file
/// containing it. File content is trimmed.
pub fn resolve_api_token(token: Option<String>, token_file: Option<&Path>) -> Result<String> {
    let token = token.filter(|value| !value.is_empty());

    match (token, token_file) {
        (Some(_), Some(_)) => Err(Error::config(
            "Ambiguous api token, use either --api-token or --api-token-file, not both!",
        )),
        (Some(token), None) => Ok(token),
        (None, Some(path)) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!(
                    "Failed to read API token file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let token = content.trim();
            if token.is_empty() {
                return Err(Error::config(format!(
                    "API token file {} is empty",
                    path.display()
                )));
            }
            Ok(token.to_string())
        }
        (None, None) => Err(Error::config(
            "You have to specify an api token; use --api-token or --api-token-file.",
        )),
    }
}

/// Basic RFC 1035 domain name check. A leading `*` label is accepted for
/// wildcard records.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if index == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
