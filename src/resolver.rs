use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::{self, AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use hyper_util::client::legacy::connect::dns::Name as HyperName;
use once_cell::sync::OnceCell;
use tower_service::Service;

#[cfg(feature = "hickory-dns")]
use crate::dns::HickoryDnsResolver;
use crate::dns::{
    Closing, DnsResolverWithOverrides, Family, GaiResolver, IntoResolve, Name, Resolve,
    ResolvedAddress, Scope,
};
use crate::error;
use crate::mdns::{IntoMdnsEngine, MdnsEngine, ServiceDaemonEngine};

const DEFAULT_MDNS_TIMEOUT: Duration = Duration::from_secs(5);

/// A resolver that sends `.local` names to multicast DNS, and everything
/// else to a unicast DNS engine.
///
/// Each call is served by exactly one engine; a failed multicast lookup is
/// never retried over unicast DNS.
///
/// The `MdnsResolver` holds its engines in an `Arc`, so cloning it is cheap
/// and every clone shares the same engines. Engines that are not supplied
/// through the builder are created on first use, and are shut down by
/// [`close`](MdnsResolver::close). Engines supplied with
/// [`MdnsResolverBuilder::mdns_engine`] or [`MdnsResolverBuilder::dns_resolver`]
/// stay owned by the caller and are left running.
///
/// Once `close` has started, new calls to `resolve` fail with an error for
/// which [`Error::is_closed`](crate::Error::is_closed) is true. Calls already
/// waiting on an engine are not cancelled; they finish against that engine,
/// and whatever it reports is surfaced unchanged.
#[derive(Clone)]
pub struct MdnsResolver {
    inner: Arc<ResolverRef>,
}

/// A `MdnsResolverBuilder` can be used to create a `MdnsResolver` with custom configuration.
#[must_use]
pub struct MdnsResolverBuilder {
    config: Config,
}

struct Config {
    error: Option<crate::Error>,
    mdns_timeout: Option<Duration>,
    mdns_engine: Option<(Arc<dyn MdnsEngine>, Ownership)>,
    dns_resolver: Option<(Arc<dyn Resolve>, Ownership)>,
    dns_overrides: HashMap<String, Vec<SocketAddr>>,
    #[cfg(feature = "hickory-dns")]
    hickory_dns: bool,
}

impl Default for MdnsResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MdnsResolverBuilder {
    /// Constructs a new `MdnsResolverBuilder`.
    ///
    /// This is the same as `MdnsResolver::builder()`.
    pub fn new() -> MdnsResolverBuilder {
        MdnsResolverBuilder {
            config: Config {
                error: None,
                mdns_timeout: Some(DEFAULT_MDNS_TIMEOUT),
                mdns_engine: None,
                dns_resolver: None,
                dns_overrides: HashMap::new(),
                #[cfg(feature = "hickory-dns")]
                hickory_dns: false,
            },
        }
    }

    /// Returns a `MdnsResolver` that uses this `MdnsResolverBuilder` configuration.
    ///
    /// # Errors
    ///
    /// This method fails if a `.local` name was given a static override.
    /// No engine is started here.
    pub fn build(self) -> crate::Result<MdnsResolver> {
        let config = self.config;

        if let Some(err) = config.error {
            return Err(err);
        }

        let overrides = if config.dns_overrides.is_empty() {
            None
        } else {
            Some(Arc::new(config.dns_overrides))
        };

        let dns = match config.dns_resolver {
            Some((resolver, ownership)) => {
                Slot::ready(with_overrides(resolver, overrides.as_ref()), ownership)
            }
            None => {
                #[cfg(feature = "hickory-dns")]
                let make_default = default_dns_resolver(config.hickory_dns);
                #[cfg(not(feature = "hickory-dns"))]
                let make_default = default_dns_resolver();

                Slot::lazy(move || Ok(with_overrides(make_default(), overrides.as_ref())))
            }
        };

        let mdns = match config.mdns_engine {
            Some((engine, ownership)) => Slot::ready(engine, ownership),
            None => Slot::lazy(|| {
                ServiceDaemonEngine::new().map(|engine| -> Arc<dyn MdnsEngine> { Arc::new(engine) })
            }),
        };

        Ok(MdnsResolver {
            inner: Arc::new(ResolverRef {
                dns,
                mdns,
                mdns_timeout: config.mdns_timeout,
                closed: AtomicBool::new(false),
            }),
        })
    }

    // Multicast options

    /// Set the upper bound for each multicast query.
    ///
    /// Default is 5 seconds. Pass `None` (or a zero duration) to never send
    /// queries: only the engine's cache is consulted, and a miss is reported
    /// as not found.
    pub fn mdns_timeout<D>(mut self, timeout: D) -> MdnsResolverBuilder
    where
        D: Into<Option<Duration>>,
    {
        self.config.mdns_timeout = timeout.into();
        self
    }

    /// Use an existing multicast engine.
    ///
    /// The engine stays owned by the caller: `MdnsResolver::close` will not
    /// shut it down.
    pub fn mdns_engine<E: IntoMdnsEngine>(mut self, engine: E) -> MdnsResolverBuilder {
        self.config.mdns_engine = Some((engine.into_mdns_engine(), Ownership::Borrowed));
        self
    }

    /// Hand a multicast engine over to the resolver.
    ///
    /// It is shut down by `MdnsResolver::close`, like an engine the resolver
    /// created itself.
    pub fn mdns_engine_owned<E: IntoMdnsEngine>(mut self, engine: E) -> MdnsResolverBuilder {
        self.config.mdns_engine = Some((engine.into_mdns_engine(), Ownership::Owned));
        self
    }

    // Unicast options

    /// Use an existing unicast DNS engine for names outside `.local`.
    ///
    /// The engine stays owned by the caller: `MdnsResolver::close` will not
    /// close it.
    pub fn dns_resolver<R: IntoResolve>(mut self, resolver: R) -> MdnsResolverBuilder {
        self.config.dns_resolver = Some((resolver.into_resolve(), Ownership::Borrowed));
        self
    }

    /// Hand a unicast DNS engine over to the resolver.
    ///
    /// It is closed by `MdnsResolver::close`.
    pub fn dns_resolver_owned<R: IntoResolve>(mut self, resolver: R) -> MdnsResolverBuilder {
        self.config.dns_resolver = Some((resolver.into_resolve(), Ownership::Owned));
        self
    }

    /// Enables the [hickory-dns](hickory_resolver) async resolver instead of a
    /// default threadpool using `getaddrinfo`, for names outside `.local`.
    ///
    /// Has no effect if an engine was given with `dns_resolver`.
    ///
    /// # Optional
    ///
    /// This requires the optional `hickory-dns` feature to be enabled.
    #[cfg(feature = "hickory-dns")]
    #[cfg_attr(docsrs, doc(cfg(feature = "hickory-dns")))]
    pub fn hickory_dns(mut self, enable: bool) -> MdnsResolverBuilder {
        self.config.hickory_dns = enable;
        self
    }

    /// Override DNS resolution for specific domains to a particular IP address.
    ///
    /// The port of `addr` is ignored; results carry the port passed to
    /// `MdnsResolver::resolve`.
    pub fn resolve(self, domain: &str, addr: SocketAddr) -> MdnsResolverBuilder {
        self.resolve_to_addrs(domain, &[addr])
    }

    /// Override DNS resolution for specific domains to particular IP addresses.
    ///
    /// Overrides apply to unicast names only. Overriding a `.local` name
    /// makes `build` fail.
    pub fn resolve_to_addrs(mut self, domain: &str, addrs: &[SocketAddr]) -> MdnsResolverBuilder {
        if Name::new(domain).scope() == Scope::Multicast {
            self.config.error = Some(
                error::builder("overrides cannot be set for multicast names").with_host(domain),
            );
            return self;
        }
        self.config
            .dns_overrides
            .insert(domain.to_owned(), addrs.to_vec());
        self
    }
}

impl fmt::Debug for MdnsResolverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("MdnsResolverBuilder");
        builder.field("mdns_timeout", &self.config.mdns_timeout);

        if self.config.mdns_engine.is_some() {
            builder.field("mdns_engine", &true);
        }
        if self.config.dns_resolver.is_some() {
            builder.field("dns_resolver", &true);
        }
        if !self.config.dns_overrides.is_empty() {
            builder.field("dns_overrides", &self.config.dns_overrides);
        }

        builder.finish()
    }
}

#[cfg(feature = "hickory-dns")]
fn default_dns_resolver(hickory_dns: bool) -> fn() -> Arc<dyn Resolve> {
    if hickory_dns {
        return || -> Arc<dyn Resolve> { Arc::new(HickoryDnsResolver::new()) };
    }
    || -> Arc<dyn Resolve> { Arc::new(GaiResolver::new()) }
}

#[cfg(not(feature = "hickory-dns"))]
fn default_dns_resolver() -> fn() -> Arc<dyn Resolve> {
    || -> Arc<dyn Resolve> { Arc::new(GaiResolver::new()) }
}

fn with_overrides(
    resolver: Arc<dyn Resolve>,
    overrides: Option<&Arc<HashMap<String, Vec<SocketAddr>>>>,
) -> Arc<dyn Resolve> {
    match overrides {
        Some(overrides) => Arc::new(DnsResolverWithOverrides::new(resolver, overrides.clone())),
        None => resolver,
    }
}

impl Default for MdnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MdnsResolver {
    /// Constructs a new `MdnsResolver` with a 5 second multicast timeout.
    ///
    /// Both engines are created on first use.
    ///
    /// # Panics
    ///
    /// Never in practice: the default configuration has nothing to reject.
    /// Use `MdnsResolver::builder()` to handle configuration errors.
    pub fn new() -> MdnsResolver {
        MdnsResolverBuilder::new()
            .build()
            .expect("MdnsResolver::new()")
    }

    /// Creates a `MdnsResolverBuilder` to configure a `MdnsResolver`.
    ///
    /// This is the same as `MdnsResolverBuilder::new()`.
    pub fn builder() -> MdnsResolverBuilder {
        MdnsResolverBuilder::new()
    }

    /// Resolve `host` to the addresses to connect to on `port`.
    ///
    /// Names under `.local` (with or without a trailing dot) are queried over
    /// multicast DNS, bounded by the configured timeout. Any other name is
    /// passed to the unicast engine.
    ///
    /// The returned list is never empty and holds no duplicates. Its order is
    /// the one the selected engine produced.
    ///
    /// # Errors
    ///
    /// - [`is_not_found`](crate::Error::is_not_found): no record exists for
    ///   the name.
    /// - [`is_timeout`](crate::Error::is_timeout): the multicast query did not
    ///   finish in time.
    /// - [`is_family_mismatch`](crate::Error::is_family_mismatch): records
    ///   exist, but none of `family`.
    /// - [`is_engine_unavailable`](crate::Error::is_engine_unavailable): the
    ///   multicast engine could not be started.
    /// - [`is_closed`](crate::Error::is_closed): `close` was called.
    /// - [`is_resolve`](crate::Error::is_resolve): the engine failed; the
    ///   engine's error is the `source()`.
    pub async fn resolve(
        &self,
        host: &str,
        port: u16,
        family: Family,
    ) -> crate::Result<Vec<ResolvedAddress>> {
        self.inner.resolve(Name::new(host), port, family).await
    }

    /// Shut down the engines this resolver owns.
    ///
    /// Engines supplied by the caller are left alone, and engines that were
    /// never used were never created. Calling this more than once is fine;
    /// only the first call releases anything.
    pub async fn close(&self) {
        self.inner.close().await
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// The bound applied to each multicast query, if queries are enabled.
    pub fn mdns_timeout(&self) -> Option<Duration> {
        self.inner.query_timeout()
    }
}

impl fmt::Debug for MdnsResolver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MdnsResolver")
            .field("mdns_timeout", &self.inner.mdns_timeout)
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct ResolverRef {
    dns: Slot<dyn Resolve>,
    mdns: Slot<dyn MdnsEngine>,
    mdns_timeout: Option<Duration>,
    closed: AtomicBool,
}

impl ResolverRef {
    async fn resolve(
        &self,
        name: Name,
        port: u16,
        family: Family,
    ) -> crate::Result<Vec<ResolvedAddress>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(error::closed().with_host(name.as_str()));
        }

        match name.scope() {
            Scope::Multicast => self.resolve_mdns(name, port, family).await,
            Scope::Global => self.resolve_dns(name, port, family).await,
        }
    }

    async fn resolve_dns(
        &self,
        name: Name,
        port: u16,
        family: Family,
    ) -> crate::Result<Vec<ResolvedAddress>> {
        let resolver = self.acquire(&self.dns, &name).await?;
        log::debug!("resolving {} ({}) via unicast dns", name, family);

        let host = name.as_str().to_owned();
        let addrs = resolver
            .resolve(name, family)
            .await
            .map_err(|err| error::resolve(err).with_host(host.as_str()))?;

        let addrs = collect(&host, port, addrs);
        if addrs.is_empty() {
            return Err(error::not_found().with_host(host));
        }
        Ok(addrs)
    }

    async fn resolve_mdns(
        &self,
        name: Name,
        port: u16,
        family: Family,
    ) -> crate::Result<Vec<ResolvedAddress>> {
        let engine = self.acquire(&self.mdns, &name).await?;
        let name = name.canonical();

        if let Some(cached) = engine.cached(&name, family).filter(|ips| !ips.is_empty()) {
            log::trace!("mdns: cache hit for {}", name);
            return answer(&name, port, family, cached);
        }

        let timeout = match self.query_timeout() {
            Some(timeout) => timeout,
            None => {
                log::debug!("mdns: queries disabled, {} not in cache", name);
                return Err(error::not_found().with_host(name.as_str()));
            }
        };

        log::debug!("resolving {} ({}) via mdns", name, family);
        let ips = match tokio::time::timeout(timeout, engine.query(&name, family, timeout)).await {
            Ok(Ok(ips)) => ips,
            Ok(Err(err)) => return Err(error::resolve(err).with_host(name.as_str())),
            Err(_elapsed) => {
                log::debug!("mdns: query for {} timed out after {:?}", name, timeout);
                return Err(error::timeout().with_host(name.as_str()));
            }
        };

        answer(&name, port, family, ips)
    }

    /// Fetch an engine, creating it if this is the first use.
    async fn acquire<T>(&self, slot: &Slot<T>, name: &Name) -> crate::Result<Arc<T>>
    where
        T: ?Sized + Shutdown,
    {
        let handle = slot
            .get_or_create()
            .map_err(|err| err.with_host(name.as_str()))?;

        // `close` may have run while the engine was being created, and
        // missed it. Pairs with the fence in `close`.
        atomic::fence(Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            if let Some(closing) = handle.release() {
                closing.await;
            }
            return Err(error::closed().with_host(name.as_str()));
        }

        Ok(handle.engine.clone())
    }

    fn query_timeout(&self) -> Option<Duration> {
        self.mdns_timeout.filter(|timeout| !timeout.is_zero())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            log::trace!("resolver already closed");
            return;
        }
        atomic::fence(Ordering::SeqCst);

        if let Some(closing) = self.mdns.get().and_then(Handle::release) {
            log::debug!("closing owned mdns engine");
            closing.await;
        }
        if let Some(closing) = self.dns.get().and_then(Handle::release) {
            log::debug!("closing owned dns engine");
            closing.await;
        }
    }
}

/// Turn a multicast answer into addresses for the requested family.
fn answer(
    name: &Name,
    port: u16,
    family: Family,
    ips: Vec<IpAddr>,
) -> crate::Result<Vec<ResolvedAddress>> {
    if ips.is_empty() {
        log::debug!("mdns: no responder for {}", name);
        return Err(error::not_found().with_host(name.as_str()));
    }

    let addrs = collect(
        name.as_str(),
        port,
        ips.into_iter()
            .filter(|ip| family.matches(*ip))
            .map(|ip| SocketAddr::new(ip, port)),
    );
    if addrs.is_empty() {
        return Err(error::family_mismatch(family).with_host(name.as_str()));
    }
    Ok(addrs)
}

/// Attach `port`, dropping duplicates while keeping the engine's order.
///
/// Only the port is rewritten; an IPv6 scope id and flow label pass through.
fn collect(
    host: &str,
    port: u16,
    addrs: impl Iterator<Item = SocketAddr>,
) -> Vec<ResolvedAddress> {
    let mut resolved: Vec<ResolvedAddress> = Vec::new();
    for mut addr in addrs {
        addr.set_port(port);
        let addr = ResolvedAddress::new(host, addr);
        if !resolved.contains(&addr) {
            resolved.push(addr);
        }
    }
    resolved
}

// Engine ownership

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ownership {
    /// Created by, or handed over to, the resolver.
    Owned,
    /// Supplied by the caller, who keeps responsibility for it.
    Borrowed,
}

trait Shutdown: Send + Sync {
    fn shutdown(&self) -> Closing;
}

impl Shutdown for dyn Resolve {
    fn shutdown(&self) -> Closing {
        self.close()
    }
}

impl Shutdown for dyn MdnsEngine {
    fn shutdown(&self) -> Closing {
        self.close()
    }
}

struct Handle<T: ?Sized> {
    engine: Arc<T>,
    ownership: Ownership,
    released: AtomicBool,
}

impl<T: ?Sized + Shutdown> Handle<T> {
    fn new(engine: Arc<T>, ownership: Ownership) -> Self {
        Handle {
            engine,
            ownership,
            released: AtomicBool::new(false),
        }
    }

    /// Returns the shutdown future the first time it's called on an owned engine.
    fn release(&self) -> Option<Closing> {
        match self.ownership {
            Ownership::Borrowed => None,
            Ownership::Owned if self.released.swap(true, Ordering::SeqCst) => None,
            Ownership::Owned => Some(self.engine.shutdown()),
        }
    }
}

type Factory<T> = Box<dyn Fn() -> crate::Result<Arc<T>> + Send + Sync>;

struct Slot<T: ?Sized> {
    cell: OnceCell<Handle<T>>,
    make: Option<Factory<T>>,
}

impl<T: ?Sized + Shutdown> Slot<T> {
    fn ready(engine: Arc<T>, ownership: Ownership) -> Self {
        Slot {
            cell: OnceCell::with_value(Handle::new(engine, ownership)),
            make: None,
        }
    }

    fn lazy<F>(make: F) -> Self
    where
        F: Fn() -> crate::Result<Arc<T>> + Send + Sync + 'static,
    {
        Slot {
            cell: OnceCell::new(),
            make: Some(Box::new(make)),
        }
    }

    fn get(&self) -> Option<&Handle<T>> {
        self.cell.get()
    }

    /// A failed creation leaves the slot empty, so the next call retries.
    fn get_or_create(&self) -> crate::Result<&Handle<T>> {
        self.cell.get_or_try_init(|| {
            let make = self
                .make
                .as_ref()
                .ok_or_else(|| error::engine_unavailable("no engine configured"))?;
            let engine = make()?;
            log::debug!("engine created");
            Ok(Handle::new(engine, Ownership::Owned))
        })
    }
}

// HTTP connector integration

impl Service<HyperName> for MdnsResolver {
    type Response = std::vec::IntoIter<SocketAddr>;
    type Error = crate::Error;
    type Future = Pin<Box<dyn Future<Output = crate::Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, name: HyperName) -> Self::Future {
        let resolver = self.inner.clone();
        let name = Name::new(name.as_str());
        Box::pin(async move {
            let addrs = resolver.resolve(name, 0, Family::Unspecified).await?;
            Ok(addrs
                .into_iter()
                .map(SocketAddr::from)
                .collect::<Vec<_>>()
                .into_iter())
        })
    }
}

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
impl reqwest::dns::Resolve for MdnsResolver {
    fn resolve(&self, name: reqwest::dns::Name) -> reqwest::dns::Resolving {
        let resolver = self.inner.clone();
        let name = Name::new(name.as_str());
        Box::pin(async move {
            let addrs = resolver.resolve(name, 0, Family::Unspecified).await?;
            let addrs: reqwest::dns::Addrs = Box::new(addrs.into_iter().map(SocketAddr::from));
            Ok(addrs)
        })
    }
}
