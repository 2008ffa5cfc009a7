//! DNS resolution
//!
//! Names under the reserved `.local` label are answered by a multicast DNS
//! engine ([`crate::mdns::MdnsEngine`]), everything else by a conventional
//! unicast engine implementing [`Resolve`].

pub use addr::{Family, ResolvedAddress};
pub use name::{classify, Name, Scope};
pub use resolve::{Addrs, Closing, IntoResolve, Resolve, Resolving};
pub(crate) use resolve::DnsResolverWithOverrides;

pub use gai::GaiResolver;
#[cfg(feature = "hickory-dns")]
pub use hickory::HickoryDnsResolver;

mod addr;
pub(crate) mod gai;
#[cfg(feature = "hickory-dns")]
pub(crate) mod hickory;
mod name;
pub(crate) mod resolve;
