//! Core DDNS engine
//!
//! The DdnsEngine runs one reconciliation pass:
//! - Loads the cache left by the previous run
//! - Resolves the current address for every enabled family via IpSource
//! - Diffs the requested domains against the cache
//! - Pushes the outstanding domains through DnsProvider
//! - Persists the new cache when the pass succeeded and something changed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌──────────────┐      ┌─────────────┐
//! │  IpSource   │◄─────│  DdnsEngine  │─────►│ DnsProvider │
//! │ (per family)│      └──────────────┘      │  (ladder)   │
//! └─────────────┘             │              └─────────────┘
//!                             ▼
//!                     ┌──────────────┐
//!                     │  CacheStore  │
//!                     │ (load/save)  │
//!                     └──────────────┘
//! ```
//!
//! ## Per-family flow
//!
//! 1. Resolve IP. On failure either delete the family's records
//!    (`delete_missing`) or report an IP service error for this family only.
//! 2. Diff against the cache. Nothing outstanding means no provider calls.
//! 3. For each outstanding domain: update with cached ids, falling back to
//!    zone lookup → record lookup → create or update.
//! 4. Record every successful domain in the new cache. A failed domain
//!    fails the family but never aborts the batch.

use std::net::IpAddr;

use tracing::{debug, error, info, warn};

use crate::SUCCESS_TARGET;
use crate::cache::{Cache, IpCache, ZoneRecord};
use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{CacheStore, DnsProvider, IpSource};
use crate::types::{ExitStatus, IpFamily, RecordType};

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Worst status across the attempted families
    pub status: ExitStatus,

    /// Cache as computed by this pass (persisted only when `status` is Ok)
    pub cache: Cache,
}

/// Core DDNS engine
///
/// The engine owns its collaborators for the duration of one pass. All
/// provider and IP calls are awaited one after another; nothing runs
/// concurrently.
pub struct DdnsEngine {
    /// IP source for the current public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for record changes
    provider: Box<dyn DnsProvider>,

    /// Store for the reconciliation cache
    cache_store: Box<dyn CacheStore>,

    /// Settings for this pass
    config: DdnsConfig,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// Fails with [`Error::Config`] when the configuration does not validate.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        cache_store: Box<dyn CacheStore>,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            cache_store,
            config,
        })
    }

    /// Run one reconciliation pass over every enabled family
    ///
    /// On any non-Ok status the cache file is deleted so the next run does a
    /// full reconciliation instead of trusting a possibly stale cache.
    pub async fn run(&self) -> RunReport {
        let old_cache = match self.load_cache().await {
            Ok(cache) => cache,
            Err(e) => {
                error!("Failed to load cache: {}", e);
                return RunReport {
                    status: ExitStatus::UnknownError,
                    cache: Cache::new(),
                };
            }
        };

        // Families not enabled this run keep their previous state.
        let mut new_cache = old_cache.clone();
        let mut statuses = Vec::new();

        for family in self.config.families() {
            let (status, family_cache) = self.update_family(family, old_cache.family(family)).await;
            *new_cache.family_mut(family) = family_cache;
            statuses.push(status);
        }

        let status = ExitStatus::worst(statuses);
        if !status.is_ok() {
            warn!("There were errors during update.");
            if let Err(e) = self.cache_store.delete().await {
                error!("Failed to delete cache: {}", e);
            }
            return RunReport {
                status,
                cache: new_cache,
            };
        }

        if !new_cache.is_empty() && new_cache != old_cache {
            if let Err(e) = self.cache_store.save(&new_cache).await {
                error!("Failed to save cache: {}", e);
                return RunReport {
                    status: ExitStatus::UnknownError,
                    cache: new_cache,
                };
            }
        } else {
            debug!("Cache unchanged, not saving");
        }

        info!(target: SUCCESS_TARGET, "Done.");
        RunReport {
            status: ExitStatus::Ok,
            cache: new_cache,
        }
    }

    /// Load the previous cache, or start fresh when forced or unreadable
    async fn load_cache(&self) -> Result<Cache> {
        if self.config.force {
            warn!("Forced update, ignoring cache");
            return Ok(Cache::new());
        }

        debug!("Using cache at {}", self.cache_store.location());
        match self.cache_store.load().await {
            Ok(cache) => Ok(cache),
            Err(Error::InvalidCache(reason)) => {
                warn!("Invalid cache file, starting fresh: {}", reason);
                if let Err(e) = self.cache_store.delete().await {
                    error!("Failed to delete invalid cache: {}", e);
                }
                Ok(Cache::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Reconcile one family; returns the family status and its new cache
    async fn update_family(&self, family: IpFamily, old: &IpCache) -> (ExitStatus, IpCache) {
        let current_ip = match self.ip_source.current(family).await {
            Ok(ip) => ip,
            Err(e) => {
                error!("{}", e);
                if !self.config.delete_missing {
                    return (ExitStatus::IpServiceError, old.clone());
                }

                self.delete_family_records(family).await;
                return (ExitStatus::Ok, IpCache::default());
            }
        };

        info!("Current {} address: {}", family, current_ip);

        let mut new = if old.is_current(current_ip) {
            old.clone()
        } else {
            IpCache::with_address(current_ip)
        };

        let outstanding = self.domains_to_update(old, current_ip);
        if outstanding.is_empty() {
            return (ExitStatus::Ok, new);
        }

        let mut success = true;
        for domain in &outstanding {
            match self.update_domain(domain, current_ip, old).await {
                Ok(record) => {
                    info!(target: SUCCESS_TARGET, "Updated \"{}\" to {}", domain, current_ip);
                    new.updated_domains.insert(domain.clone(), record);
                }
                Err(e) => {
                    success = false;
                    error!("Failed to update records for domain \"{}\": {}", domain, e);
                    if self.config.debug {
                        debug!("{:?}", e);
                    }
                    new.updated_domains.remove(domain);
                }
            }
        }

        if success {
            (ExitStatus::Ok, new)
        } else {
            (ExitStatus::ProviderError, new)
        }
    }

    /// Best-effort removal of the family's records when no address exists
    async fn delete_family_records(&self, family: IpFamily) {
        let record_type = family.record_type();
        for domain in &self.config.domains {
            if let Err(e) = self.provider.delete_record(domain, record_type).await {
                warn!("Failed to delete {} record for \"{}\": {}", record_type, domain, e);
            }
        }
    }

    /// Domains needing a provider call, with the operator-facing summary
    fn domains_to_update(&self, old: &IpCache, current_ip: IpAddr) -> Vec<String> {
        let outstanding =
            old.domains_to_update(&self.config.domains, current_ip, self.config.proxied);

        if !old.is_current(current_ip) {
            return outstanding;
        }

        let cached = old.up_to_date_domains(self.config.proxied);
        if cached.is_empty() {
            info!("There are no domains with this IP address in cache.");
        } else {
            info!(
                target: SUCCESS_TARGET,
                "Domains with this IP address in cache: {}",
                cached.join(", ")
            );
        }

        if outstanding.is_empty() {
            info!(target: SUCCESS_TARGET, "Every domain is up-to-date for {}.", current_ip);
        }

        outstanding
    }

    /// Push one domain: cached ids first, then the full resolution ladder
    async fn update_domain(&self, domain: &str, ip: IpAddr, old: &IpCache) -> Result<ZoneRecord> {
        let proxied = self.config.proxied;

        if let Some(cached) = old.updated_domains.get(domain) {
            match self
                .provider
                .update_record(
                    domain,
                    ip,
                    Some(&cached.zone_id),
                    Some(&cached.record_id),
                    proxied,
                )
                .await
            {
                Ok(()) => {
                    return Ok(ZoneRecord {
                        zone_id: cached.zone_id.clone(),
                        record_id: cached.record_id.clone(),
                        proxied,
                    });
                }
                Err(e) => {
                    warn!("Couldn't update \"{}\" with cached ids, resolving again: {}", domain, e);
                }
            }
        }

        let zone_id = self.provider.resolve_zone(domain).await?;

        let record_id = match self
            .provider
            .resolve_record(domain, RecordType::for_ip(ip))
            .await
        {
            Ok(record_id) => {
                self.provider
                    .update_record(domain, ip, Some(&zone_id), Some(&record_id), proxied)
                    .await?;
                record_id
            }
            Err(e) if e.is_record_not_found() => {
                self.provider.create_record(domain, ip, proxied).await?
            }
            Err(e) => return Err(e),
        };

        Ok(ZoneRecord {
            zone_id,
            record_id,
            proxied,
        })
    }
}

/// Check the API token and list the zones it can manage
///
/// Returns [`ExitStatus::ProviderError`] when the token is rejected or the
/// provider cannot be reached.
pub async fn verify_token(provider: &dyn DnsProvider) -> ExitStatus {
    if let Err(e) = provider.verify_token().await {
        match e {
            Error::TokenInvalid(_) => error!("API token is invalid!"),
            other => error!("Failed to verify API token for other reason: {}", other),
        }
        return ExitStatus::ProviderError;
    }

    let zones = match provider.list_zones().await {
        Ok(zones) => zones,
        Err(e) => {
            error!("Failed to list zones: {}", e);
            return ExitStatus::ProviderError;
        }
    };

    info!(
        target: SUCCESS_TARGET,
        "API token is valid for managing the following zones:"
    );
    for zone in &zones {
        info!("  - {}", zone.name);
    }

    ExitStatus::Ok
}
