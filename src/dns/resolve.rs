use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use super::{Family, Name};
use crate::error::BoxError;

/// Alias for an `Iterator` trait object over `SocketAddr`.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, BoxError>> + Send>>;

/// Alias for the `Future` type returned when shutting an engine down.
pub type Closing = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Trait for the unicast DNS engine used for globally scoped names.
pub trait Resolve: Send + Sync {
    /// Performs DNS resolution on a `Name`.
    /// The return type is a future containing an iterator of `SocketAddr`.
    ///
    /// It differs from `tower_service::Service<Name>` in several ways:
    ///  * It is assumed that `resolve` will always be ready to poll.
    ///  * It does not need a mutable reference to `self`.
    ///  * Since trait objects cannot make use of associated types, it requires
    ///    wrapping the returned `Future` and its contained `Iterator` with `Box`.
    ///
    /// Only addresses of `family` should be yielded. Ports are overwritten by
    /// the caller, so `0` is fine.
    fn resolve(&self, name: Name, family: Family) -> Resolving;

    /// Release whatever the engine holds.
    ///
    /// Only called by `MdnsResolver::close` for engines it owns.
    fn close(&self) -> Closing {
        Box::pin(std::future::ready(()))
    }
}

/// A more general trait implemented for types implementing `Resolve`.
///
/// Unnameable, only exported to aid seeing what implements this.
pub trait IntoResolve {
    #[doc(hidden)]
    fn into_resolve(self) -> Arc<dyn Resolve>;
}

pub(crate) struct DnsResolverWithOverrides {
    dns_resolver: Arc<dyn Resolve>,
    overrides: Arc<HashMap<String, Vec<SocketAddr>>>,
}

impl DnsResolverWithOverrides {
    pub(crate) fn new(
        dns_resolver: Arc<dyn Resolve>,
        overrides: Arc<HashMap<String, Vec<SocketAddr>>>,
    ) -> Self {
        DnsResolverWithOverrides {
            dns_resolver,
            overrides,
        }
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name, family: Family) -> Resolving {
        match self.overrides.get(name.as_str()) {
            Some(dest) => {
                log::trace!("dns override hit for {}", name);
                let addrs: Addrs = Box::new(
                    dest.clone()
                        .into_iter()
                        .filter(move |addr| family.matches(addr.ip())),
                );
                Box::pin(std::future::ready(Ok(addrs)))
            }
            None => self.dns_resolver.resolve(name, family),
        }
    }

    fn close(&self) -> Closing {
        self.dns_resolver.close()
    }
}

impl IntoResolve for Arc<dyn Resolve> {
    fn into_resolve(self) -> Arc<dyn Resolve> {
        self
    }
}

impl<R> IntoResolve for Arc<R>
where
    R: Resolve + 'static,
{
    fn into_resolve(self) -> Arc<dyn Resolve> {
        self
    }
}

impl<R> IntoResolve for R
where
    R: Resolve + 'static,
{
    fn into_resolve(self) -> Arc<dyn Resolve> {
        Arc::new(self)
    }
}
