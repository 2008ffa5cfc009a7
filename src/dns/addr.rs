use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// The address family requested for a resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Family {
    /// Any family; both IPv4 and IPv6 records are kept.
    #[default]
    Unspecified,
    /// IPv4 records only.
    V4,
    /// IPv6 records only.
    V6,
}

impl Family {
    /// Returns true if `ip` belongs to this family.
    pub fn matches(self, ip: IpAddr) -> bool {
        match self {
            Family::Unspecified => true,
            Family::V4 => ip.is_ipv4(),
            Family::V6 => ip.is_ipv6(),
        }
    }

    /// The family of a concrete address.
    pub fn of(ip: IpAddr) -> Family {
        match ip {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Unspecified => "IP",
            Family::V4 => "IPv4",
            Family::V6 => "IPv6",
        })
    }
}

/// One address produced by a resolution.
///
/// Addresses coming from the multicast and the unicast engine look the same;
/// IPv6 flow info and scope id travel inside the `SocketAddr`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    hostname: String,
    addr: SocketAddr,
}

impl ResolvedAddress {
    /// Create an address for `hostname`.
    pub fn new(hostname: impl Into<String>, addr: SocketAddr) -> ResolvedAddress {
        ResolvedAddress {
            hostname: hostname.into(),
            addr,
        }
    }

    /// The hostname this address was resolved for.
    ///
    /// Multicast results use the fully qualified form, e.g. `printer.local.`.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The IP address.
    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    /// The port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// The address family, never `Unspecified`.
    pub fn family(&self) -> Family {
        Family::of(self.addr.ip())
    }

    /// The socket address to connect to.
    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl From<ResolvedAddress> for SocketAddr {
    fn from(addr: ResolvedAddress) -> SocketAddr {
        addr.addr
    }
}
