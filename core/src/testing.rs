//! Canned transport for tests and offline use.
//!
//! `FixtureTransport` answers each remote method with a fixed XML body and
//! records what was asked, so callers can assert how many round-trips an
//! operation cost.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use url::Url;

use crate::client::qualified_method;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

const METHOD_FIELD: &str = "name=\"method\"\r\n\r\n";

#[derive(Debug, Default)]
pub struct FixtureTransport {
    fixtures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `body`. Upload and replace requests are keyed by
    /// `upload` and `replace`.
    pub fn with(mut self, method: &str, body: impl Into<String>) -> Self {
        self.fixtures.insert(fixture_key(method), body.into());
        self
    }

    /// Methods requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        let key = fixture_key(method);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| **call == key)
            .count()
    }
}

impl Transport for FixtureTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let key = request_key(&request)?;
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(key.clone());
        let body = match self.fixtures.get(&key) {
            Some(body) => body.clone(),
            None => format!(r#"<rsp stat="fail"><err code="112" msg="Method &quot;{key}&quot; not found"/></rsp>"#),
        };
        Ok(HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/xml; charset=utf-8".to_string())],
            body,
        })
    }
}

fn fixture_key(method: &str) -> String {
    match method {
        "upload" | "replace" => method.to_string(),
        _ => qualified_method(method),
    }
}

/// The `method` parameter from the query or the multipart body; for
/// uploads, the last path segment of the endpoint.
fn request_key(request: &HttpRequest) -> Result<String, ApiError> {
    let url = Url::parse(&request.url).map_err(|err| ApiError::Transport(err.to_string()))?;
    if let Some((_, method)) = url.query_pairs().find(|(key, _)| key == "method") {
        return Ok(method.into_owned());
    }
    if let Some(body) = &request.body {
        let body = String::from_utf8_lossy(body);
        if let Some(start) = body.find(METHOD_FIELD) {
            let rest = &body[start + METHOD_FIELD.len()..];
            let end = rest.find("\r\n").unwrap_or(rest.len());
            return Ok(rest[..end].to_string());
        }
    }
    url.path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Transport(format!("cannot route {}", request.url)))
}
