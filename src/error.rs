use std::error::Error as StdError;
use std::fmt;

use crate::dns::Family;

/// A `Result` alias where the `Err` case is `reqwest_mdns::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Errors that may occur when resolving a name.
///
/// Note: Errors may include the full hostname that was being resolved.
pub struct Error {
    inner: Box<Inner>,
}

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    host: Option<String>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
                host: None,
            }),
        }
    }

    /// Returns the hostname related to this error, if any.
    pub fn host(&self) -> Option<&str> {
        self.inner.host.as_deref()
    }

    pub(crate) fn with_host(mut self, host: impl Into<String>) -> Self {
        self.inner.host = Some(host.into());
        self
    }

    /// Returns true if the error is from a `MdnsResolverBuilder`.
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if no record exists for the name in its namespace.
    pub fn is_not_found(&self) -> bool {
        matches!(self.inner.kind, Kind::NotFound)
    }

    /// Returns true if the error is related to a timeout.
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if err.is::<TimedOut>() {
                return true;
            }
            source = err.source();
        }

        false
    }

    /// Returns true if records were found, but none of the requested family.
    pub fn is_family_mismatch(&self) -> bool {
        matches!(self.inner.kind, Kind::FamilyMismatch(_))
    }

    /// Returns true if a resolution engine could not be started.
    pub fn is_engine_unavailable(&self) -> bool {
        matches!(self.inner.kind, Kind::EngineUnavailable)
    }

    /// Returns true if the resolver was already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self.inner.kind, Kind::Closed)
    }

    /// Returns true if the error came from a resolution engine.
    ///
    /// The engine's own error is available through `source()`.
    pub fn is_resolve(&self) -> bool {
        matches!(self.inner.kind, Kind::Resolve)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("reqwest_mdns::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref host) = self.inner.host {
            builder.field("host", host);
        }
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::NotFound => f.write_str("name not found")?,
            Kind::Timeout => f.write_str("mdns query timed out")?,
            Kind::FamilyMismatch(family) => {
                write!(f, "no {} address found", family)?;
            }
            Kind::EngineUnavailable => f.write_str("resolution engine unavailable")?,
            Kind::Closed => f.write_str("resolver is closed")?,
            Kind::Resolve => f.write_str("resolution error")?,
        }

        if let Some(host) = &self.inner.host {
            write!(f, " for host ({})", host)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Kind {
    Builder,
    NotFound,
    Timeout,
    FamilyMismatch(Family),
    EngineUnavailable,
    Closed,
    Resolve,
}

// constructors

pub(crate) fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder, Some(e))
}

pub(crate) fn not_found() -> Error {
    Error::new(Kind::NotFound, None::<Error>)
}

pub(crate) fn timeout() -> Error {
    Error::new(Kind::Timeout, Some(TimedOut))
}

pub(crate) fn family_mismatch(family: Family) -> Error {
    Error::new(Kind::FamilyMismatch(family), None::<Error>)
}

pub(crate) fn engine_unavailable<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::EngineUnavailable, Some(e))
}

pub(crate) fn closed() -> Error {
    Error::new(Kind::Closed, None::<Error>)
}

/// Wraps an engine error, unless the engine already produced one of ours.
pub(crate) fn resolve(e: BoxError) -> Error {
    match e.downcast::<Error>() {
        Ok(err) => *err,
        Err(e) => Error::new(Kind::Resolve, Some(e)),
    }
}

#[derive(Debug)]
pub(crate) struct TimedOut;

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("operation timed out")
    }
}

impl StdError for TimedOut {}
