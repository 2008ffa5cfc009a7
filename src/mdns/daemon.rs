use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use mdns_sd::{HostnameResolutionEvent, ServiceDaemon};

use super::{MdnsEngine, Querying};
use crate::dns::{Closing, Family, Name};
use crate::error::BoxError;

/// An [`MdnsEngine`] backed by an [`mdns_sd::ServiceDaemon`].
///
/// The daemon owns the multicast sockets and runs on its own thread.
///
/// A query waits for an answer of the requested family; answers of the other
/// family are skipped. A host that only announces IPv4 therefore times out
/// when asked for IPv6, rather than reporting a family mismatch. Cached
/// answers and engines that return every record they find are filtered by
/// the resolver, and do report the mismatch.
#[derive(Clone)]
pub struct ServiceDaemonEngine {
    daemon: ServiceDaemon,
}

impl ServiceDaemonEngine {
    /// Start a new daemon.
    ///
    /// Fails if the multicast sockets cannot be bound.
    pub fn new() -> crate::Result<Self> {
        let daemon = ServiceDaemon::new().map_err(crate::error::engine_unavailable)?;
        log::debug!("mdns: service daemon started");
        Ok(ServiceDaemonEngine { daemon })
    }

    /// Use a daemon that is already running.
    pub fn from_daemon(daemon: ServiceDaemon) -> Self {
        ServiceDaemonEngine { daemon }
    }
}

impl fmt::Debug for ServiceDaemonEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDaemonEngine").finish()
    }
}

impl MdnsEngine for ServiceDaemonEngine {
    fn query(&self, name: &Name, family: Family, timeout: Duration) -> Querying {
        let daemon = self.daemon.clone();
        let hostname = name.as_str().to_owned();
        Box::pin(async move {
            // The caller enforces `timeout`; the daemon keeps searching
            // until the guard below stops it.
            log::trace!("mdns: querying {} (timeout {:?})", hostname, timeout);
            let receiver = daemon
                .resolve_hostname(&hostname, None)
                .map_err(|err| -> BoxError { Box::new(err) })?;
            let _search = SearchGuard {
                daemon: daemon.clone(),
                hostname: hostname.clone(),
            };

            while let Ok(event) = receiver.recv_async().await {
                match event {
                    HostnameResolutionEvent::AddressesFound(_, addrs) => {
                        let found = matching(addrs, family);
                        if !found.is_empty() {
                            return Ok(found);
                        }
                    }
                    HostnameResolutionEvent::SearchStopped(_) => break,
                    _ => {}
                }
            }

            Ok(Vec::new())
        })
    }

    fn close(&self) -> Closing {
        let daemon = self.daemon.clone();
        Box::pin(async move {
            match daemon.shutdown() {
                Ok(status) => {
                    let _ = status.recv_async().await;
                    log::debug!("mdns: service daemon shut down");
                }
                Err(err) => {
                    log::debug!("mdns: service daemon already shut down: {}", err);
                }
            }
        })
    }
}

fn matching(addrs: HashSet<IpAddr>, family: Family) -> Vec<IpAddr> {
    addrs.into_iter().filter(|ip| family.matches(*ip)).collect()
}

/// Stops the daemon-side search once the query completes or is dropped.
struct SearchGuard {
    daemon: ServiceDaemon,
    hostname: String,
}

impl Drop for SearchGuard {
    fn drop(&mut self) {
        if let Err(err) = self.daemon.stop_resolve_hostname(&self.hostname) {
            log::trace!("mdns: stopping search for {} failed: {}", self.hostname, err);
        }
    }
}
