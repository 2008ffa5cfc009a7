#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # reqwest-mdns
//!
//! The `reqwest-mdns` crate provides a DNS resolver for HTTP clients that
//! understands the multicast DNS `.local` namespace.
//!
//! - Names under `.local` are resolved over multicast DNS, with a bounded
//!   query time.
//! - Every other name goes to a conventional unicast resolver (`getaddrinfo`
//!   by default, or [hickory-dns][hickory] with the `hickory-dns` feature).
//! - Plugs into `hyper-util`'s `HttpConnector`, and into `reqwest` with the
//!   `reqwest` feature.
//!
//! ## Resolving a name
//!
//! ```no_run
//! use reqwest_mdns::{dns::Family, MdnsResolver};
//!
//! # async fn run() -> Result<(), reqwest_mdns::Error> {
//! let resolver = MdnsResolver::new();
//!
//! for addr in resolver.resolve("printer.local", 631, Family::Unspecified).await? {
//!     println!("{} -> {}", addr.hostname(), addr.socket_addr());
//! }
//!
//! resolver.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Use [`MdnsResolver::builder()`] to change the multicast timeout, share an
//! existing multicast engine, or pick the unicast engine. Engines that the
//! resolver creates itself are shut down by [`MdnsResolver::close`]; engines
//! handed in with [`MdnsResolverBuilder::mdns_engine`] are not.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use reqwest_mdns::{mdns::ServiceDaemonEngine, MdnsResolver};
//!
//! # fn run() -> Result<(), reqwest_mdns::Error> {
//! let engine = Arc::new(ServiceDaemonEngine::new()?);
//!
//! let resolver = MdnsResolver::builder()
//!     .mdns_engine(engine.clone())
//!     .mdns_timeout(Duration::from_secs(2))
//!     .build()?;
//! # drop(resolver);
//! # Ok(())
//! # }
//! ```
//!
//! ## With reqwest
//!
//! ```ignore
//! let client = reqwest::Client::builder()
//!     .dns_resolver(Arc::new(reqwest_mdns::MdnsResolver::new()))
//!     .build()?;
//! ```
//!
//! ## Optional Features
//!
//! - **hickory-dns**: Enables a hickory-dns async resolver instead of
//!   `getaddrinfo` for names outside `.local`.
//! - **reqwest**: Implements `reqwest::dns::Resolve` for [`MdnsResolver`].
//!
//! [hickory]: https://github.com/hickory-dns/hickory-dns

pub use self::error::{Error, Result};
pub use self::resolver::{MdnsResolver, MdnsResolverBuilder};

pub mod dns;
mod error;
pub mod mdns;
mod resolver;
