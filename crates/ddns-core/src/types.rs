//! Shared value types: address families, record types and run status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address family of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    /// IPv4, managed through A records
    V4,
    /// IPv6, managed through AAAA records
    V6,
}

impl IpFamily {
    /// Address record type managed for this family
    pub fn record_type(self) -> RecordType {
        match self {
            IpFamily::V4 => RecordType::A,
            IpFamily::V6 => RecordType::Aaaa,
        }
    }

    /// Version digit used in log messages
    pub fn version(self) -> u8 {
        match self {
            IpFamily::V4 => 4,
            IpFamily::V6 => 6,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.version())
    }
}

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Record type for an address: `A` when the address is expressible as
    /// IPv4 (including IPv4-mapped IPv6), `AAAA` otherwise.
    pub fn for_ip(ip: IpAddr) -> Self {
        if ip.to_canonical().is_ipv4() {
            RecordType::A
        } else {
            RecordType::Aaaa
        }
    }

    /// Wire name of the record type
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a reconciliation pass (or of one family within it)
///
/// The discriminants are the process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// Everything succeeded
    Ok = 0,
    /// Configuration or cache I/O error
    UnknownError = 1,
    /// No usable address found for a requested family
    IpServiceError = 2,
    /// Auth rejected, API error, or any domain update failure
    ProviderError = 3,
}

impl ExitStatus {
    /// Process exit code
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == ExitStatus::Ok
    }

    /// Combine family results: the lowest non-zero code wins, so an
    /// unknown error pre-empts an IP service error, which pre-empts a
    /// provider error.
    pub fn worst<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ExitStatus>,
    {
        statuses
            .into_iter()
            .filter(|status| !status.is_ok())
            .min_by_key(|status| status.code())
            .unwrap_or(ExitStatus::Ok)
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}
