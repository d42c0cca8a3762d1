//! Error types for request dispatch, normalization and the batch protocol.

use std::fmt;

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::http::Transport) implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it as the source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors while building or sending a request.
#[derive(Debug, Error)]
pub enum RequestError {
    // Build errors (exit code 2)
    #[error("unable to create a request: invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    // Transport errors (exit code 3)
    #[error("unable to request api {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
}

impl RequestError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RequestError::InvalidUrl { .. } => 2,
            RequestError::Transport { .. } => 3,
        }
    }
}

/// Structured error reported in-band by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
    pub code: i64,
    pub type_name: String,
    pub correlation_id: Option<String>,
    /// `ErrorValue` from batch replies; usually absent.
    pub value: Option<String>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Code: {}, {}", self.message, self.code, self.type_name)?;
        if let Some(id) = &self.correlation_id {
            write!(f, ", Correlation ID: {}", id)?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for RemoteError {}

/// Errors while normalizing a response body.
///
/// Every variant keeps the original bytes so callers can fall back to
/// parsing them by hand.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("invalid JSON: {source}")]
    InvalidJson {
        raw: Vec<u8>,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized response shape: expected {expected}")]
    UnrecognizedShape { raw: Vec<u8>, expected: &'static str },

    #[error("remote error: {error}")]
    Remote { raw: Vec<u8>, error: RemoteError },
}

impl NormalizeError {
    /// The payload that failed to normalize, unmodified.
    pub fn raw(&self) -> &[u8] {
        match self {
            NormalizeError::InvalidJson { raw, .. }
            | NormalizeError::UnrecognizedShape { raw, .. }
            | NormalizeError::Remote { raw, .. } => raw,
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            NormalizeError::Remote { .. } => 1,
            _ => 2,
        }
    }
}

/// Errors decoding a normalized response into a caller type.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("cannot decode response: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from a ProcessQuery (CSOM batch) call.
#[derive(Debug, Error)]
pub enum ProcessQueryError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("invalid ProcessQuery reply: {source}")]
    InvalidJson {
        raw: Vec<u8>,
        #[source]
        source: serde_json::Error,
    },

    #[error("empty ProcessQuery reply")]
    EmptyReply { raw: Vec<u8> },

    #[error("{error}")]
    Remote { raw: Vec<u8>, error: RemoteError },
}

impl ProcessQueryError {
    /// The reply body, when one was received.
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            ProcessQueryError::Request(_) => None,
            ProcessQueryError::InvalidJson { raw, .. }
            | ProcessQueryError::EmptyReply { raw }
            | ProcessQueryError::Remote { raw, .. } => Some(raw),
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcessQueryError::Request(e) => e.exit_code(),
            ProcessQueryError::Remote { .. } => 1,
            _ => 2,
        }
    }
}

/// Errors while serializing a CSOM request body.
#[derive(Debug, Error)]
pub enum CsomError {
    #[error("failed to write CSOM XML: {message}")]
    Write { message: String },

    #[error("CSOM action references unknown object path {id}")]
    UnknownObjectPath { id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteError {
        RemoteError {
            message: "Item does not exist".into(),
            code: -2147024809,
            type_name: "System.ArgumentException".into(),
            correlation_id: Some("abc-123".into()),
            value: None,
        }
    }

    #[test]
    fn remote_error_display_carries_all_fields() {
        assert_eq!(
            remote().to_string(),
            "Item does not exist (Code: -2147024809, System.ArgumentException, Correlation ID: abc-123)"
        );
    }

    #[test]
    fn remote_error_display_without_correlation_id() {
        let err = RemoteError {
            correlation_id: None,
            ..remote()
        };
        assert_eq!(
            err.to_string(),
            "Item does not exist (Code: -2147024809, System.ArgumentException)"
        );
    }

    #[test]
    fn request_error_exit_codes() {
        let err = RequestError::InvalidUrl {
            url: "::".into(),
            source: url::ParseError::RelativeUrlWithoutBase,
        };
        assert_eq!(err.exit_code(), 2);

        let err = RequestError::Transport {
            url: "https://contoso.sharepoint.com".into(),
            source: TransportError::new("connection refused"),
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            "unable to request api https://contoso.sharepoint.com: connection refused"
        );
    }

    #[test]
    fn normalize_error_keeps_raw_bytes() {
        let err = NormalizeError::UnrecognizedShape {
            raw: b"42".to_vec(),
            expected: "an entity object",
        };
        assert_eq!(err.raw(), b"42");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn process_query_error_exit_codes() {
        let err = ProcessQueryError::Remote {
            raw: b"[]".to_vec(),
            error: remote(),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.raw(), Some(&b"[]"[..]));

        let err = ProcessQueryError::from(RequestError::Transport {
            url: "https://contoso.sharepoint.com".into(),
            source: TransportError::new("timeout"),
        });
        assert_eq!(err.exit_code(), 3);
        assert!(err.raw().is_none());
    }
}
