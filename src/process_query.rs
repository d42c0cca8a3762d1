//! ProcessQuery (CSOM batch) dispatch and reply decoding.

use serde::Deserialize;
use serde_json::Value;

use crate::client::{parse_url, SpClient};
use crate::config::RequestConfig;
use crate::error::{ProcessQueryError, RemoteError, RequestError};
use crate::http::{HttpMethod, HttpRequest, Transport};

/// Path segments of the batch endpoint, appended at the API root.
const PROCESS_QUERY_SEGMENTS: [&str; 3] = ["_vti_bin", "client.svc", "ProcessQuery"];

/// Path segment marking the REST API root.
const API_SEGMENT: &str = "_api";

/// Decoded ProcessQuery reply.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReply {
    pub schema_version: String,
    pub library_version: String,
    pub trace_correlation_id: String,
    /// Reply elements after the header, in order.
    pub results: Vec<Value>,
    /// The reply body as received.
    pub raw: Vec<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReplyHeader {
    #[serde(default)]
    schema_version: String,
    #[serde(default)]
    library_version: String,
    #[serde(default)]
    error_info: Option<ErrorInfo>,
    #[serde(default)]
    trace_correlation_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorInfo {
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    error_value: Option<String>,
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_type_name: String,
}

/// Resolve the ProcessQuery endpoint for any URL under a site.
///
/// Endpoints already targeting `_vti_bin/client.svc/ProcessQuery` keep their
/// path unchanged. Otherwise the path is cut at its `_api` segment (or kept whole if there
/// is none) and the batch segments are appended. Query and fragment are
/// dropped.
///
/// # Errors
///
/// Returns `RequestError::InvalidUrl` if `endpoint` is not an absolute URL.
pub fn process_query_endpoint(endpoint: &str) -> Result<String, RequestError> {
    let mut url = parse_url(endpoint)?;
    let invalid = || RequestError::InvalidUrl {
        url: endpoint.to_string(),
        source: url::ParseError::RelativeUrlWithoutBase,
    };

    let segments: Vec<String> = url
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let already_targeted = segments.len() >= PROCESS_QUERY_SEGMENTS.len()
        && segments[segments.len() - PROCESS_QUERY_SEGMENTS.len()..]
            .iter()
            .zip(PROCESS_QUERY_SEGMENTS)
            .all(|(have, want)| have.eq_ignore_ascii_case(want));

    if !already_targeted {
        let cut = segments
            .iter()
            .position(|s| s.eq_ignore_ascii_case(API_SEGMENT))
            .unwrap_or(segments.len());
        // Segments are still percent-encoded; set_path leaves escapes alone.
        let path: String = segments[..cut]
            .iter()
            .map(String::as_str)
            .chain(PROCESS_QUERY_SEGMENTS)
            .flat_map(|segment| ["/", segment])
            .collect();
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.into())
}

/// Decode a ProcessQuery reply body.
///
/// # Errors
///
/// Returns `ProcessQueryError::InvalidJson` if the body is not a JSON array,
/// `ProcessQueryError::EmptyReply` if the array is empty, and
/// `ProcessQueryError::Remote` if the header element carries `ErrorInfo`.
/// Each variant keeps the raw body.
pub fn decode_reply(raw: Vec<u8>) -> Result<BatchReply, ProcessQueryError> {
    let elements: Vec<Value> = match serde_json::from_slice(&raw) {
        Ok(elements) => elements,
        Err(source) => return Err(ProcessQueryError::InvalidJson { raw, source }),
    };

    let mut elements = elements.into_iter();
    let Some(first) = elements.next() else {
        return Err(ProcessQueryError::EmptyReply { raw });
    };

    let header: ReplyHeader = match serde_json::from_value(first) {
        Ok(header) => header,
        Err(source) => return Err(ProcessQueryError::InvalidJson { raw, source }),
    };

    if let Some(info) = header.error_info {
        return Err(ProcessQueryError::Remote {
            raw,
            error: RemoteError {
                message: info.error_message,
                code: info.error_code,
                type_name: info.error_type_name,
                correlation_id: Some(header.trace_correlation_id)
                    .filter(|id| !id.is_empty()),
                value: info.error_value,
            },
        });
    }

    Ok(BatchReply {
        schema_version: header.schema_version,
        library_version: header.library_version,
        trace_correlation_id: header.trace_correlation_id,
        results: elements.collect(),
        raw,
    })
}

impl<T: Transport> SpClient<T> {
    /// Send a CSOM body to the site's ProcessQuery endpoint.
    ///
    /// Headers from `config` (authentication, for instance) are sent too, but
    /// never replace the batch protocol headers. HTTP status is not
    /// inspected; failure is signaled by `ErrorInfo` in the reply.
    pub fn process_query(
        &self,
        endpoint: &str,
        body: String,
        config: Option<&RequestConfig>,
    ) -> Result<BatchReply, ProcessQueryError> {
        let url = process_query_endpoint(endpoint)?;

        let mut request = HttpRequest::new(HttpMethod::Post, url);
        if let Some(config) = config {
            for (name, value) in config.headers() {
                request.set_header(name.as_str(), value.as_str());
            }
        }
        request.set_header("Accept", "*/*");
        request.set_header("Content-Type", r#"text/xml;charset="UTF-8""#);
        request.set_header("X-Requested-With", "XMLHttpRequest");
        request.body = Some(body.into_bytes());

        let response = self.send(&request)?;
        decode_reply(response.body)
    }
}
