//! Resource descriptors: the path and query parameters that identify one
//! remote JSON collection, plus the helper that completes relative asset
//! references returned by the API.
//!
//! Descriptors are plain values.  Two descriptors with the same path, method
//! and parameters compare equal; changing any parameter yields a new
//! descriptor, and activating a view with it always issues a fresh request
//! (nothing is cached).

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Url;
use serde_json::Value;

use crate::fetch::FetchError;

/// HTTP method of a descriptor.  Only `POST` carries a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post(Value),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post(_) => "POST",
        }
    }
}

/// A remote JSON resource: path relative to the API base plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: String,
    params: BTreeMap<String, String>,
    method: Method,
}

impl Resource {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
            method: Method::Get,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
            method: Method::Post(body),
        }
    }

    /// Add (or replace) a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Build the request URL against the API base.
    ///
    /// Relative paths are joined onto `base` (a leading `/` is ignored so
    /// `"/api/x.php"` and `"api/x.php"` both land under the base path).
    /// Absolute `http(s)` paths are used as-is.  Parameters are appended in
    /// key order.
    pub fn url(&self, base: &Url) -> Result<Url, FetchError> {
        let joined = if has_http_scheme(&self.path) {
            Url::parse(&self.path)
        } else {
            base.join(self.path.trim_start_matches('/'))
        };
        let mut url = joined.map_err(|e| FetchError::InvalidUrl {
            input: self.path.clone(),
            reason: e.to_string(),
        })?;

        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.name(), self.path)?;
        let mut sep = '?';
        for (key, value) in &self.params {
            write!(f, "{sep}{key}={value}")?;
            sep = '&';
        }
        Ok(())
    }
}

/// Complete a file or image reference returned by the API.
///
/// Absolute references (`http://`, `https://`, `data:`) are returned
/// unchanged, protocol-relative ones (`//host/x`) get `https:`, and anything
/// else is resolved against `base`.  Blank references yield `None`.
pub fn resolve_asset(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if has_http_scheme(reference) || reference.starts_with("data:") {
        return Some(reference.to_string());
    }
    if let Some(rest) = reference.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    base.join(reference.trim_start_matches('/'))
        .ok()
        .map(String::from)
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
