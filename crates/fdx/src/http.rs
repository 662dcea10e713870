//! 📡 HTTP plumbing: requests, responses, and the `Transport` seam between them.
//!
//! 🧠 Knowledge graph:
//! - `HttpRequest` / `HttpResponse`: plain data, no I/O. Easy to build, easy to assert on.
//! - `Transport`: "send this, give me whatever came back". `Err` means *no response at all*.
//!   A 500 is still an `Ok`; it is a response, just a rude one.
//! - `ReqwestTransport`: the production transport. One pooled `reqwest::Client`, shared.
//! - `RetryingHttpClient` (in `client`): auth, base URL, retry policy, logging.
//!
//! ⚠️ The transport never retries. Retries are a policy decision and policy lives one floor up.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;

use crate::error::{FdxError, Result};
use crate::redact::Redactor;

pub mod client;
pub mod reqwest_transport;
#[cfg(test)]
pub(crate) mod scripted;

pub use client::{RequestParts, RetryConfig, RetryingHttpClient};
pub use reqwest_transport::{HttpConfig, ReqwestTransport};

/// 🔧 Query parameters. Sorted, unique keys: "set page=3" means exactly one `page`.
pub type QueryParams = BTreeMap<String, String>;

/// 🚦 The three verbs this crate speaks. GET is the only one we ever repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        };
        f.write_str(verb)
    }
}

/// 📦 What goes in the request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Bytes(Bytes),
}

/// 📨 A fully resolved request: absolute URL, final query, every header.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: QueryParams,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: QueryParams::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// 🔍 First header value with this name, case-insensitive. Tests love this one.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 🧹 Headers with secret values masked, ready for a log line.
    pub fn redacted_headers(&self, redactor: &Redactor) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), redactor.header(k, v)))
            .collect()
    }
}

// 🔒 Hand-written so the Authorization header never shows up in a `{:?}`.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redactor = Redactor::default();
        let headers = self.redacted_headers(&redactor);
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// 📬 A response that actually arrived. Status can be anything; that is the caller's problem.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub method: HttpMethod,
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// 🏗️ Builds a response for `request`, handy for transports and test fakes alike.
    pub fn for_request(request: &HttpRequest, status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 📜 Body as text, invalid UTF-8 replaced. For logs and error messages only.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// 🧩 Parses the body as JSON. An empty body is `null`, not an error.
    pub fn json(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| FdxError::Decode {
            context: format!("JSON body of {} {}", self.method, self.url),
            message: e.to_string(),
        })
    }

    /// 🚫 Turns status >= 400 into `FdxError::Remote`. Everything else passes through untouched.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.as_u16() >= 400 {
            return Err(FdxError::Remote {
                method: self.method,
                url: self.url.clone(),
                status: self.status.as_u16(),
                body: self.text_lossy(),
            });
        }
        Ok(self)
    }
}

/// 🔌 The transport never produced a response. Connection refused, DNS, timeout, you name it.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// 🔌 Sends one request, exactly once.
///
/// # Contract 📜
/// - `Ok(response)` for *any* response, 2xx or not.
/// - `Err(TransportFailure)` only when nothing came back.
/// - Implementations must be safe to share between concurrent readers.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    async fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportFailure>;
}
