// # ddns-core
//
// Reconciliation engine that keeps DNS address records at a hosted DNS
// provider in sync with the host's public IP addresses.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public address per family
// - **DnsProvider**: Trait for resolving zones/records and writing address records
// - **CacheStore**: Trait for persisting the reconciliation cache between runs
// - **Cache**: Per-family record of the last applied address and provider ids
// - **DdnsEngine**: One reconciliation pass: IP → cache diff → provider → cache
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **One pass per invocation**: No daemon, no background tasks, no retries
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: The cache ensures unchanged runs make no provider calls

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod traits;
pub mod types;

/// Tracing target for the "success" console channel
///
/// Events logged at INFO with this target are rendered as successes by the
/// console formatter.
pub const SUCCESS_TARGET: &str = "ddns::success";

// Re-export core types for convenience
pub use cache::{Cache, FileCacheStore, IpCache, MemoryCacheStore, ZoneRecord};
pub use config::DdnsConfig;
pub use engine::{DdnsEngine, RunReport, verify_token};
pub use error::{Error, Result};
pub use traits::{CacheStore, DnsProvider, DnsRecord, IpSource, Zone};
pub use types::{ExitStatus, IpFamily, RecordType};
