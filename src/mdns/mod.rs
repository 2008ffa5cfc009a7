//! Multicast DNS engines
//!
//! An [`MdnsEngine`] answers host record queries for names under `.local`.
//! The default engine, [`ServiceDaemonEngine`], runs an `mdns-sd` daemon; any
//! other implementation (a shared daemon, a test double) can be handed to
//! [`MdnsResolverBuilder`](crate::MdnsResolverBuilder).

use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::dns::{Closing, Family, Name};
use crate::error::BoxError;

pub use self::daemon::ServiceDaemonEngine;

mod daemon;

/// Alias for the `Future` type returned by a multicast query.
pub type Querying = Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, BoxError>> + Send>>;

/// A multicast DNS engine.
///
/// Engines are shared by every concurrent resolution of a resolver, so they
/// must be safe to call from several tasks at once.
pub trait MdnsEngine: Send + Sync {
    /// Query host records for `name`.
    ///
    /// `name` is always fully qualified (`host.local.`) and lowercased.
    /// `family` is a hint; the resolver filters the answer again. An empty
    /// answer means no responder knows the name.
    ///
    /// The resolver stops polling the returned future once `timeout` has
    /// elapsed, and dropping it must cancel the query.
    fn query(&self, name: &Name, family: Family, timeout: Duration) -> Querying;

    /// Addresses for `name` already known to the engine, if any.
    ///
    /// A non-empty answer here skips the network query entirely.
    fn cached(&self, name: &Name, family: Family) -> Option<Vec<IpAddr>> {
        let _ = (name, family);
        None
    }

    /// Shut the engine down.
    ///
    /// Only called by `MdnsResolver::close` for engines it owns. Calling it
    /// on an engine that is already shut down must not panic.
    fn close(&self) -> Closing;
}

/// A more general trait implemented for types implementing `MdnsEngine`.
///
/// Unnameable, only exported to aid seeing what implements this.
pub trait IntoMdnsEngine {
    #[doc(hidden)]
    fn into_mdns_engine(self) -> Arc<dyn MdnsEngine>;
}

impl IntoMdnsEngine for Arc<dyn MdnsEngine> {
    fn into_mdns_engine(self) -> Arc<dyn MdnsEngine> {
        self
    }
}

impl<E> IntoMdnsEngine for Arc<E>
where
    E: MdnsEngine + 'static,
{
    fn into_mdns_engine(self) -> Arc<dyn MdnsEngine> {
        self
    }
}

impl<E> IntoMdnsEngine for E
where
    E: MdnsEngine + 'static,
{
    fn into_mdns_engine(self) -> Arc<dyn MdnsEngine> {
        Arc::new(self)
    }
}
