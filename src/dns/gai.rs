use std::io;
use std::str::FromStr;

use futures_util::future::FutureExt;
use hyper_util::client::legacy::connect::dns::{GaiResolver as HyperGaiResolver, Name as HyperName};
use tower_service::Service;

use crate::dns::{Addrs, Family, Name, Resolve, Resolving};
use crate::error::BoxError;

/// A resolver using blocking `getaddrinfo` calls in a threadpool.
///
/// Based on [`hyper_util`]s [`GaiResolver`](hyper_util::client::legacy::connect::dns::GaiResolver).
/// This is the default unicast engine of an `MdnsResolver`.
///
/// A lookup for a name that does not exist fails with an error for which
/// [`Error::is_not_found`](crate::Error::is_not_found) is true. Other
/// `getaddrinfo` failures are passed through as the error's source.
#[derive(Debug, Clone)]
pub struct GaiResolver(HyperGaiResolver);

impl GaiResolver {
    /// Construct a new [`GaiResolver`].
    pub fn new() -> Self {
        Self(HyperGaiResolver::new())
    }
}

impl Default for GaiResolver {
    fn default() -> Self {
        GaiResolver::new()
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name, family: Family) -> Resolving {
        let name = match HyperName::from_str(name.as_str()) {
            Ok(name) => name,
            Err(err) => return Box::pin(std::future::ready(Err(Box::new(err) as BoxError))),
        };
        let host = name.as_str().to_owned();
        let this = &mut self.0.clone();
        Box::pin(this.call(name).map(move |result| {
            result
                .map(|addrs| -> Addrs {
                    Box::new(addrs.filter(move |addr| family.matches(addr.ip())))
                })
                .map_err(|err| -> BoxError {
                    if is_name_not_known(&err) {
                        Box::new(crate::error::not_found().with_host(host))
                    } else {
                        Box::new(err)
                    }
                })
        }))
    }
}

// std reports `EAI_NONAME`/`EAI_NODATA` with an unstable error kind, so
// the resolver's message has to be inspected.
fn is_name_not_known(err: &io::Error) -> bool {
    #[cfg(windows)]
    {
        // WSAHOST_NOT_FOUND, WSANO_DATA
        if matches!(err.raw_os_error(), Some(11001) | Some(11004)) {
            return true;
        }
    }

    let msg = err.to_string();
    [
        "Name or service not known",
        "No address associated with hostname",
        "nodename nor servname provided, or not known",
        "Name does not resolve",
    ]
    .iter()
    .any(|known| msg.contains(known))
}
