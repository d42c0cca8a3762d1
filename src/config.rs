//! Request header configuration and verbosity presets.

use std::str::FromStr;
use std::sync::OnceLock;

/// Legacy default `Accept` header, applied when no config overrides it.
pub const DEFAULT_ACCEPT: &str = "application/json;odata=verbose";

/// `Content-Type` sent with write operations, regardless of read verbosity.
pub const WRITE_CONTENT_TYPE: &str = "application/json;odata=verbose;charset=utf-8";

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// JSON metadata verbosity the service is asked to respond with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verbosity {
    Verbose,
    MinimalMetadata,
    NoMetadata,
}

impl Verbosity {
    /// Returns the `Accept` header value for this verbosity.
    pub fn accept(&self) -> &'static str {
        match self {
            Verbosity::Verbose => "application/json;odata=verbose",
            Verbosity::MinimalMetadata => "application/json;odata=minimalmetadata",
            Verbosity::NoMetadata => "application/json;odata=nometadata",
        }
    }

    /// Returns the shared, immutable preset config for this verbosity.
    pub fn preset(&self) -> &'static RequestConfig {
        static PRESETS: OnceLock<[RequestConfig; 3]> = OnceLock::new();
        let presets = PRESETS.get_or_init(|| {
            [
                RequestConfig::for_verbosity(Verbosity::Verbose),
                RequestConfig::for_verbosity(Verbosity::MinimalMetadata),
                RequestConfig::for_verbosity(Verbosity::NoMetadata),
            ]
        });
        match self {
            Verbosity::Verbose => &presets[0],
            Verbosity::MinimalMetadata => &presets[1],
            Verbosity::NoMetadata => &presets[2],
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verbose" => Ok(Verbosity::Verbose),
            "minimalmetadata" | "minimal" => Ok(Verbosity::MinimalMetadata),
            "nometadata" | "none" => Ok(Verbosity::NoMetadata),
            other => Err(format!(
                "unknown verbosity \"{}\": expected verbose, minimalmetadata, or nometadata",
                other
            )),
        }
    }
}

/// Headers applied on top of the dispatcher defaults.
///
/// Header names compare case-insensitively; setting a header that is already
/// present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    headers: Vec<(String, String)>,
    verbosity: Option<Verbosity>,
}

impl RequestConfig {
    /// Create an empty ad-hoc config.
    pub fn new() -> Self {
        Self::default()
    }

    fn for_verbosity(verbosity: Verbosity) -> Self {
        let mut config = Self::new()
            .header("Accept", verbosity.accept())
            .header("Content-Type", WRITE_CONTENT_TYPE)
            .header("Accept-Language", ACCEPT_LANGUAGE);
        config.verbosity = Some(verbosity);
        config
    }

    /// Add or replace a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of a header, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The preset this config was created from, if any.
    pub fn verbosity(&self) -> Option<Verbosity> {
        self.verbosity
    }
}

pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
    {
        Some(entry) => entry.1 = value,
        None => headers.push((name, value)),
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
