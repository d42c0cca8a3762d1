//! Request dispatch with default headers and verb tunneling.

use log::debug;

use crate::config::{RequestConfig, DEFAULT_ACCEPT, WRITE_CONTENT_TYPE};
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::resource::Resource;

/// Logical operation; DELETE and MERGE travel as POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
    Merge,
}

impl Verb {
    fn method(&self) -> HttpMethod {
        match self {
            Verb::Get => HttpMethod::Get,
            Verb::Post | Verb::Delete | Verb::Merge => HttpMethod::Post,
        }
    }

    /// Value of `X-Http-Method` for tunneled verbs.
    fn tunneled(&self) -> Option<&'static str> {
        match self {
            Verb::Delete => Some("DELETE"),
            Verb::Merge => Some("MERGE"),
            Verb::Get | Verb::Post => None,
        }
    }
}

/// Client for SharePoint-style REST endpoints.
///
/// Builds requests, applies default headers and hands them to the transport.
/// Non-2xx responses are returned as-is: the service reports many failures
/// in-band, so status interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct SpClient<T> {
    transport: T,
}

impl<T: Transport> SpClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start a fluent resource chain at `endpoint`.
    pub fn resource(&self, endpoint: impl Into<String>) -> Resource<'_, T> {
        Resource::new(self, endpoint)
    }

    /// GET `endpoint` and return the response body.
    pub fn get(&self, endpoint: &str, config: Option<&RequestConfig>) -> Result<Vec<u8>, RequestError> {
        self.execute(Verb::Get, endpoint, None, config).map(|r| r.body)
    }

    /// POST `body` to `endpoint` and return the response body.
    pub fn post(
        &self,
        endpoint: &str,
        body: Option<Vec<u8>>,
        config: Option<&RequestConfig>,
    ) -> Result<Vec<u8>, RequestError> {
        self.execute(Verb::Post, endpoint, body, config).map(|r| r.body)
    }

    /// Delete the resource at `endpoint` unconditionally (`If-Match: *`).
    pub fn delete(&self, endpoint: &str, config: Option<&RequestConfig>) -> Result<Vec<u8>, RequestError> {
        self.execute(Verb::Delete, endpoint, None, config).map(|r| r.body)
    }

    /// MERGE `body` into the resource at `endpoint` unconditionally (`If-Match: *`).
    pub fn update(
        &self,
        endpoint: &str,
        body: Vec<u8>,
        config: Option<&RequestConfig>,
    ) -> Result<Vec<u8>, RequestError> {
        self.execute(Verb::Merge, endpoint, Some(body), config).map(|r| r.body)
    }

    /// Build and send a request, returning the full response.
    pub fn execute(
        &self,
        verb: Verb,
        endpoint: &str,
        body: Option<Vec<u8>>,
        config: Option<&RequestConfig>,
    ) -> Result<HttpResponse, RequestError> {
        let request = build_request(verb, endpoint, body, config)?;
        self.send(&request)
    }

    pub(crate) fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RequestError> {
        debug!(
            "{} {}{}",
            request.method.as_str(),
            request.url,
            request
                .header("X-Http-Method")
                .map(|verb| format!(" (X-Http-Method: {})", verb))
                .unwrap_or_default()
        );

        let response = self
            .transport
            .execute(request)
            .map_err(|source| RequestError::Transport {
                url: request.url.clone(),
                source,
            })?;

        debug!(
            "{} {} -> {} ({} bytes)",
            request.method.as_str(),
            request.url,
            response.status,
            response.body.len()
        );
        Ok(response)
    }
}

/// Build the wire request for a logical verb.
///
/// Order of header application: defaults, then caller config (caller wins),
/// then tunneling headers, which always win.
pub fn build_request(
    verb: Verb,
    endpoint: &str,
    body: Option<Vec<u8>>,
    config: Option<&RequestConfig>,
) -> Result<HttpRequest, RequestError> {
    parse_url(endpoint)?;

    let mut request = HttpRequest::new(verb.method(), endpoint);
    request.set_header("Accept", DEFAULT_ACCEPT);
    if verb != Verb::Get {
        request.set_header("Content-Type", WRITE_CONTENT_TYPE);
        request.body = body;
    }

    if let Some(config) = config {
        for (name, value) in config.headers() {
            request.set_header(name.as_str(), value.as_str());
        }
    }

    if let Some(tunneled) = verb.tunneled() {
        request.set_header("X-Http-Method", tunneled);
        request.set_header("If-Match", "*");
    }

    Ok(request)
}

pub(crate) fn parse_url(endpoint: &str) -> Result<url::Url, RequestError> {
    url::Url::parse(endpoint).map_err(|source| RequestError::InvalidUrl {
        url: endpoint.to_string(),
        source,
    })
}
