//! Transport seam and the error taxonomy for remote fetches.
//!
//! Everything that talks to the API goes through the [`Transport`] trait:
//! one call, one request, no caching.  [`HttpTransport`] is the real thing;
//! tests swap in scripted implementations.
//!
//! ## For contributors
//!
//! Pages never build HTTP requests themselves.  They describe what they need
//! with a [`Resource`](crate::resource::Resource) and call [`fetch`],
//! [`batch`] or [`join`] from their loader.

mod batch;
mod http;

pub use batch::{batch, join, Joined};
pub use http::HttpTransport;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::normalize::{normalize, Normalized};
use crate::resource::Resource;

/// Anything that can turn a [`Resource`] into decoded JSON.
///
/// Loaders run on background threads, so implementations must be
/// [`Send`] + [`Sync`].
pub trait Transport: Send + Sync {
    /// Issue exactly one request and decode the body as JSON.
    ///
    /// Non-2xx statuses and undecodable bodies are errors.
    fn send(&self, resource: &Resource) -> Result<Value, FetchError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, resource: &Resource) -> Result<Value, FetchError> {
        (**self).send(resource)
    }
}

/// Send one request and normalize whatever envelope comes back.
pub fn fetch(transport: &dyn Transport, resource: &Resource) -> Result<Normalized, FetchError> {
    normalize(transport.send(resource)?)
}

/// Errors that can occur while fetching and reshaping a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized response shape: {0}")]
    Shape(String),

    #[error("could not read record: {0}")]
    Transform(String),

    #[error("request worker stopped before completing")]
    Aborted,
}

/// Coarse classification of a [`FetchError`], used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Request,
    Timeout,
    Network,
    Status,
    Decode,
    Shape,
    Transform,
    Aborted,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidUrl { .. } => ErrorKind::Request,
            FetchError::Timeout { .. } => ErrorKind::Timeout,
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::Status { .. } => ErrorKind::Status,
            FetchError::Decode { .. } => ErrorKind::Decode,
            FetchError::Shape(_) => ErrorKind::Shape,
            FetchError::Transform(_) => ErrorKind::Transform,
            FetchError::Aborted => ErrorKind::Aborted,
        }
    }
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Request => "request",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Status => "status",
            ErrorKind::Decode => "decode",
            ErrorKind::Shape => "shape",
            ErrorKind::Transform => "transform",
            ErrorKind::Aborted => "aborted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Value);

    impl Transport for Fixed {
        fn send(&self, _resource: &Resource) -> Result<Value, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn fetch_normalizes_the_response() {
        let transport = Fixed(json!({"success": true, "data": [{"id": 1}]}));
        let normalized = fetch(&transport, &Resource::get("api/x.php")).unwrap();
        assert_eq!(normalized, Normalized::Items(vec![json!({"id": 1})]));
    }

    #[test]
    fn arc_transport_delegates() {
        let transport: Arc<dyn Transport> = Arc::new(Fixed(json!([])));
        assert_eq!(transport.send(&Resource::get("x")).unwrap(), json!([]));
    }

    #[test]
    fn kinds_distinguish_causes() {
        let status = FetchError::Status { url: "u".into(), status: 404 };
        let decode = FetchError::Decode {
            url: "u".into(),
            source: serde_json::from_str::<Value>("{").unwrap_err(),
        };
        assert_eq!(status.kind(), ErrorKind::Status);
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert_eq!(FetchError::Shape("x".into()).kind().to_string(), "shape");
        assert_eq!(status.to_string(), "u responded with HTTP 404");
    }
}
