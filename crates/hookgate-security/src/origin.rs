//! Caller address allow-listing.
//!
//! The allow-list is assembled once from the provider's published hook
//! ranges plus operator additions and is read-only afterwards.

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use hookgate_core::GateError;
use thiserror::Error;
use tracing::warn;

/// Hook source ranges published by the provider.
pub const PROVIDER_HOOK_RANGES: [&str; 11] = [
    "140.82.112.0/20",
    "143.55.64.0/20",
    "185.199.108.0/22",
    "192.30.252.0/22",
    "20.201.28.151/32",
    "20.205.243.166/32",
    "20.248.137.48/32",
    "20.207.73.82/32",
    "20.27.177.113/32",
    "20.200.245.247/32",
    "20.233.54.53/32",
];

/// CIDR parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    /// Missing `/prefix` part.
    #[error("missing prefix length in {0:?}")]
    MissingPrefix(String),
    /// Network part is not an address.
    #[error("invalid network address in {0:?}")]
    InvalidAddress(String),
    /// Prefix is not a number or too long for the address family.
    #[error("invalid prefix length in {0:?}")]
    InvalidPrefix(String),
}

/// A contiguous block of addresses. Host bits are cleared on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrRange {
    network: IpAddr,
    prefix_len: u8,
}

impl CidrRange {
    /// Creates a range, masking off host bits of `network`.
    ///
    /// # Errors
    ///
    /// `CidrError::InvalidPrefix` if `prefix_len` exceeds the family width.
    pub fn new(network: IpAddr, prefix_len: u8) -> Result<Self, CidrError> {
        let network = match network {
            IpAddr::V4(addr) if prefix_len <= 32 => {
                IpAddr::V4(Ipv4Addr::from(u32::from(addr) & v4_mask(prefix_len)))
            },
            IpAddr::V6(addr) if prefix_len <= 128 => {
                IpAddr::V6(Ipv6Addr::from(u128::from(addr) & v6_mask(prefix_len)))
            },
            _ => return Err(CidrError::InvalidPrefix(format!("{network}/{prefix_len}"))),
        };
        Ok(Self { network, prefix_len })
    }

    /// Network address.
    pub const fn network(&self) -> IpAddr {
        self.network
    }

    /// Prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `addr` lies inside this range. Families never mix.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                u32::from(ip) & v4_mask(self.prefix_len) == u32::from(net)
            },
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                u128::from(ip) & v6_mask(self.prefix_len) == u128::from(net)
            },
            _ => false,
        }
    }
}

impl FromStr for CidrRange {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) =
            s.split_once('/').ok_or_else(|| CidrError::MissingPrefix(s.to_string()))?;
        let network: IpAddr = addr.parse().map_err(|_| CidrError::InvalidAddress(s.to_string()))?;
        let prefix_len: u8 = prefix.parse().map_err(|_| CidrError::InvalidPrefix(s.to_string()))?;
        Self::new(network, prefix_len)
    }
}

impl fmt::Display for CidrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

fn v4_mask(prefix_len: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0)
}

fn v6_mask(prefix_len: u8) -> u128 {
    u128::MAX.checked_shl(128 - u32::from(prefix_len)).unwrap_or(0)
}

/// Immutable set of permitted caller ranges.
#[derive(Debug, Clone)]
pub struct AllowList {
    ranges: Vec<CidrRange>,
    allow_loopback: bool,
}

impl AllowList {
    /// Builds the list from the provider ranges plus `extra` entries.
    ///
    /// Entries that fail to parse are dropped with a warning. Loopback
    /// callers are admitted only when `strict` is false.
    pub fn new<S: AsRef<str>>(extra: &[S], strict: bool) -> Self {
        let ranges = PROVIDER_HOOK_RANGES
            .iter()
            .copied()
            .chain(extra.iter().map(AsRef::as_ref))
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| match entry.parse::<CidrRange>() {
                Ok(range) => Some(range),
                Err(error) => {
                    warn!(entry, error = %error, "dropping invalid allow-list range");
                    None
                },
            })
            .collect();

        Self { ranges, allow_loopback: !strict }
    }

    /// Builds a list from exactly `ranges`, without the provider defaults.
    pub fn from_ranges(ranges: Vec<CidrRange>, strict: bool) -> Self {
        Self { ranges, allow_loopback: !strict }
    }

    /// Number of valid ranges held.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no range was accepted.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ranges in the order they were configured.
    pub fn ranges(&self) -> &[CidrRange] {
        &self.ranges
    }

    /// Classifies a textual caller address.
    ///
    /// IPv4-mapped IPv6 addresses are matched as their IPv4 form.
    ///
    /// # Errors
    ///
    /// `InvalidOrigin` when the text is not an address, `ForbiddenOrigin`
    /// when it falls outside every range.
    pub fn check(&self, origin: &str) -> Result<IpAddr, GateError> {
        let addr = parse_origin(origin)?;

        if self.allow_loopback && addr.is_loopback() {
            return Ok(addr);
        }

        if self.ranges.iter().any(|range| range.contains(addr)) {
            Ok(addr)
        } else {
            Err(GateError::ForbiddenOrigin)
        }
    }
}

/// Parses and normalizes a caller address.
///
/// # Errors
///
/// `GateError::InvalidOrigin` when `origin` is not an IP address.
pub fn parse_origin(origin: &str) -> Result<IpAddr, GateError> {
    let addr: IpAddr = origin.trim().parse().map_err(|_| GateError::InvalidOrigin)?;
    Ok(match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(addr, IpAddr::V4),
        IpAddr::V4(_) => addr,
    })
}
