//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public address per family
//! - [`DnsProvider`]: Resolve, create, update and delete address records
//! - [`CacheStore`]: Persist the reconciliation cache between runs

pub mod cache_store;
pub mod dns_provider;
pub mod ip_source;

pub use cache_store::CacheStore;
pub use dns_provider::{DnsProvider, DnsRecord, Zone};
pub use ip_source::IpSource;
