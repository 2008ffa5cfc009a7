//! DNS resolution via the [hickory-resolver](https://github.com/hickory-dns/hickory-dns) crate

use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    lookup_ip::LookupIpIntoIter,
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use once_cell::sync::OnceCell;

use std::net::SocketAddr;
use std::sync::Arc;

use super::{Addrs, Family, Name, Resolve, Resolving};
use crate::error::BoxError;

/// Wrapper around a hickory `TokioResolver`, which implements the `Resolve` trait.
#[derive(Debug, Default, Clone)]
pub struct HickoryDnsResolver {
    /// Since we might not have been called in the context of a
    /// Tokio Runtime in initialization, so we must delay the actual
    /// construction of the resolver.
    state: Arc<OnceCell<TokioResolver>>,
}

impl HickoryDnsResolver {
    /// Construct a resolver reading the system configuration on first use.
    pub fn new() -> Self {
        Self::default()
    }
}

struct SocketAddrs {
    iter: LookupIpIntoIter,
    family: Family,
}

impl Resolve for HickoryDnsResolver {
    fn resolve(&self, name: Name, family: Family) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let resolver = resolver.state.get_or_init(new_resolver);

            let lookup = resolver
                .lookup_ip(name.as_str())
                .await
                .map_err(|err| -> BoxError {
                    if err.is_no_records_found() {
                        log::debug!("hickory-dns: no records for {}", name);
                        Box::new(crate::error::not_found().with_host(name.as_str()))
                    } else {
                        Box::new(err)
                    }
                })?;
            let addrs: Addrs = Box::new(SocketAddrs {
                iter: lookup.into_iter(),
                family,
            });
            Ok(addrs)
        })
    }
}

impl Iterator for SocketAddrs {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<Self::Item> {
        let family = self.family;
        self.iter
            .by_ref()
            .find(|ip_addr| family.matches(*ip_addr))
            .map(|ip_addr| SocketAddr::new(ip_addr, 0))
    }
}

/// Create a new resolver with the default configuration,
/// which reads from `/etc/resolve.conf`. If reading `/etc/resolv.conf` fails,
/// it fallbacks to hickory_resolver's default config.
/// The options are overridden to look up for both IPv4 and IPv6 addresses,
/// the requested family is applied to the answer.
fn new_resolver() -> TokioResolver {
    let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|err| {
        log::debug!(
            "hickory-dns: failed to load system DNS configuration; falling back to hickory_resolver defaults: {:?}",
            err
        );
        TokioResolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
    });
    builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    builder.build()
}
