//! IPv6 address helpers for 6LoWPAN autoconfiguration.
//!
//! Every LR-WPAN device gets a 16-bit short MAC address. Its interface
//! identifier is `0000:00ff:fe00:XXXX` (RFC 4944, section 6), which is
//! combined with `fe80::/64` for the link-local address and with the
//! configured prefix for the global one.

use std::fmt;
use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};

/// Interface index of the loopback device
pub const LOOPBACK_INTERFACE: u32 = 0;

/// Interface index of the 6LoWPAN device
pub const RADIO_INTERFACE: u32 = 1;

const SHORT_ADDRESS_IID: u64 = 0x0000_00ff_fe00_0000;

/// Network prefix used for global addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6Prefix {
    pub network: Ipv6Addr,
    pub len: u8,
}

impl Ipv6Prefix {
    pub fn new(network: Ipv6Addr, len: u8) -> Self {
        Self { network, len }
    }

    /// Whether a 64-bit interface identifier fits below the prefix
    pub fn is_valid(&self) -> bool {
        self.len <= 64
    }

    fn mask(&self) -> u128 {
        match self.len {
            0 => 0,
            len => u128::MAX << (128 - u32::from(len.min(128))),
        }
    }

    /// Combine the prefix with an interface identifier
    pub fn with_iid(&self, iid: u64) -> Ipv6Addr {
        let network = u128::from(self.network) & self.mask();
        Ipv6Addr::from(network | u128::from(iid))
    }
}

impl Default for Ipv6Prefix {
    fn default() -> Self {
        Self::new(Ipv6Addr::new(0x2020, 0x1, 0, 0, 0, 0, 0, 0), 64)
    }
}

impl fmt::Display for Ipv6Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.len)
    }
}

/// Interface identifier derived from a 16-bit short MAC address
pub fn short_address_iid(short_address: u16) -> u64 {
    SHORT_ADDRESS_IID | u64::from(short_address)
}

/// Link-local address for a short MAC address
pub fn link_local(short_address: u16) -> Ipv6Addr {
    Ipv6Prefix::new(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 64).with_iid(short_address_iid(short_address))
}

/// Format a short MAC address the way LR-WPAN traces print it ("00:01")
pub fn format_short_address(short_address: u16) -> String {
    let [hi, lo] = short_address.to_be_bytes();
    format!("{:02x}:{:02x}", hi, lo)
}
