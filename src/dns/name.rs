use std::fmt;
use std::str::FromStr;

/// The reserved multicast DNS label, with its leading separator.
const LOCAL_SUFFIX: &[u8] = b".local";

/// Which namespace a hostname belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The name lives under `.local`, and is answered over multicast DNS.
    Multicast,
    /// Any other name, answered by the conventional DNS hierarchy.
    Global,
}

/// Classify a hostname by its suffix.
///
/// Matching is ASCII case-insensitive and ignores a single trailing `.`.
/// No other validation happens here; malformed names are left for the
/// engine to reject.
///
/// ```
/// use reqwest_mdns::dns::{classify, Scope};
///
/// assert_eq!(classify("printer.local."), Scope::Multicast);
/// assert_eq!(classify("Printer.LOCAL"), Scope::Multicast);
/// assert_eq!(classify("notlocal.com"), Scope::Global);
/// ```
pub fn classify(host: &str) -> Scope {
    let host = host.strip_suffix('.').unwrap_or(host).as_bytes();

    if host.len() >= LOCAL_SUFFIX.len()
        && host[host.len() - LOCAL_SUFFIX.len()..].eq_ignore_ascii_case(LOCAL_SUFFIX)
    {
        Scope::Multicast
    } else {
        Scope::Global
    }
}

/// A name that must be resolved to addresses.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Wrap a hostname, as given.
    pub fn new(host: impl Into<Box<str>>) -> Name {
        Name { host: host.into() }
    }

    /// View the name as a string.
    pub fn as_str(&self) -> &str {
        &self.host
    }

    /// The namespace this name belongs to.
    pub fn scope(&self) -> Scope {
        classify(&self.host)
    }

    /// Lowercased, fully qualified form of this name (always ends in `.`).
    pub fn canonical(&self) -> Name {
        let mut host = self.host.to_ascii_lowercase();
        if !host.ends_with('.') {
            host.push('.');
        }
        Name::new(host)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

impl FromStr for Name {
    type Err = sealed::InvalidNameError;

    fn from_str(host: &str) -> Result<Self, Self::Err> {
        if host.is_empty() {
            return Err(sealed::InvalidNameError { _ext: () });
        }
        Ok(Name::new(host))
    }
}

mod sealed {
    use std::fmt;

    #[derive(Debug)]
    pub struct InvalidNameError {
        pub(super) _ext: (),
    }

    impl fmt::Display for InvalidNameError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("invalid DNS name")
        }
    }

    impl std::error::Error for InvalidNameError {}
}
