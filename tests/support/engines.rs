//! Recording stand-ins for the multicast and unicast engines.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest_mdns::dns::{Addrs, Closing, Family, Name, Resolve, Resolving};
use reqwest_mdns::mdns::{MdnsEngine, Querying};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
enum Answer {
    Records(Vec<IpAddr>),
    After(Duration, Vec<IpAddr>),
    Never,
    Fail(&'static str),
}

pub fn ips(list: &[&str]) -> Vec<IpAddr> {
    list.iter().map(|ip| ip.parse().unwrap()).collect()
}

/// Counts calls, and records what it was asked.
#[derive(Default)]
pub struct Calls {
    resolves: AtomicUsize,
    closes: AtomicUsize,
    cancelled: Arc<AtomicUsize>,
    names: Mutex<Vec<String>>,
}

impl Calls {
    fn record(&self, name: &Name) {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.names.lock().unwrap().push(name.as_str().to_owned());
    }

    /// How many queries reached the engine.
    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    /// How many times the engine was shut down.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// How many queries were dropped before finishing.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }
}

type Responding<T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send>>;

fn respond<T, F>(answer: &Answer, cancelled: &Arc<AtomicUsize>, wrap: F) -> Responding<T>
where
    T: Send + 'static,
    F: FnOnce(Vec<IpAddr>) -> T + Send + 'static,
{
    let answer = answer.clone();
    let guard = CancelGuard {
        cancelled: cancelled.clone(),
        armed: true,
    };
    Box::pin(async move {
        let mut guard = guard;
        let result = match answer {
            Answer::Records(ips) => Ok(wrap(ips)),
            Answer::After(delay, ips) => {
                tokio::time::sleep(delay).await;
                Ok(wrap(ips))
            }
            Answer::Never => std::future::pending().await,
            Answer::Fail(msg) => Err(BoxError::from(msg)),
        };
        guard.armed = false;
        result
    })
}

struct CancelGuard {
    cancelled: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A multicast engine with a scripted answer.
pub struct FakeMdns {
    answer: Answer,
    cache: Option<Vec<IpAddr>>,
    calls: Calls,
}

impl FakeMdns {
    pub fn answering(records: &[&str]) -> FakeMdns {
        FakeMdns::new(Answer::Records(ips(records)))
    }

    pub fn answering_after(delay: Duration, records: &[&str]) -> FakeMdns {
        FakeMdns::new(Answer::After(delay, ips(records)))
    }

    /// Never answers.
    pub fn silent() -> FakeMdns {
        FakeMdns::new(Answer::Never)
    }

    pub fn failing(msg: &'static str) -> FakeMdns {
        FakeMdns::new(Answer::Fail(msg))
    }

    pub fn with_cache(mut self, records: &[&str]) -> FakeMdns {
        self.cache = Some(ips(records));
        self
    }

    fn new(answer: Answer) -> FakeMdns {
        FakeMdns {
            answer,
            cache: None,
            calls: Calls::default(),
        }
    }

    pub fn calls(&self) -> &Calls {
        &self.calls
    }
}

impl MdnsEngine for FakeMdns {
    fn query(&self, name: &Name, _family: Family, _timeout: Duration) -> Querying {
        self.calls.record(name);
        respond(&self.answer, &self.calls.cancelled, |ips| ips)
    }

    fn cached(&self, _name: &Name, _family: Family) -> Option<Vec<IpAddr>> {
        self.cache.clone()
    }

    fn close(&self) -> Closing {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::ready(()))
    }
}

/// A unicast engine with a scripted answer, filtering by family like a
/// real stub resolver would.
pub struct FakeDns {
    answer: Answer,
    calls: Calls,
}

impl FakeDns {
    pub fn answering(records: &[&str]) -> FakeDns {
        FakeDns::new(Answer::Records(ips(records)))
    }

    pub fn answering_after(delay: Duration, records: &[&str]) -> FakeDns {
        FakeDns::new(Answer::After(delay, ips(records)))
    }

    pub fn failing(msg: &'static str) -> FakeDns {
        FakeDns::new(Answer::Fail(msg))
    }

    fn new(answer: Answer) -> FakeDns {
        FakeDns {
            answer,
            calls: Calls::default(),
        }
    }

    pub fn calls(&self) -> &Calls {
        &self.calls
    }
}

impl Resolve for FakeDns {
    fn resolve(&self, name: Name, family: Family) -> Resolving {
        self.calls.record(&name);
        respond(&self.answer, &self.calls.cancelled, move |ips| -> Addrs {
            Box::new(
                ips.into_iter()
                    .filter(move |ip| family.matches(*ip))
                    .map(|ip| SocketAddr::new(ip, 0)),
            )
        })
    }

    fn close(&self) -> Closing {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::ready(()))
    }
}
