//! The real [`Transport`]: a blocking `reqwest` client bound to the API base.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::{FetchError, Transport};
use crate::resource::{Method, Resource};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sends requests to the configured API origin.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Build a transport for `base`.
    ///
    /// `timeout` bounds the whole request; `connect_timeout` bounds only the
    /// TCP/TLS handshake.
    pub fn new(base: Url, timeout: Duration, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl Transport for HttpTransport {
    fn send(&self, resource: &Resource) -> Result<Value, FetchError> {
        let url = resource.url(&self.base)?;
        debug!(method = resource.method().name(), %url, "sending request");

        let request = match resource.method() {
            Method::Get => self.client.get(url.clone()),
            Method::Post(body) => self.client.post(url.clone()).json(body),
        };

        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| classify(&url, e))?;
        // Some PHP endpoints emit a byte-order mark ahead of the JSON.
        let body = body.strip_prefix(UTF8_BOM).unwrap_or(&body[..]);
        debug!(%url, bytes = body.len(), "response received");

        serde_json::from_slice(body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

fn classify(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: err,
        }
    }
}
