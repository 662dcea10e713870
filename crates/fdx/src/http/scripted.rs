//! 🎭 A transport that reads its lines from a script. Test-only.
//!
//! Push responses (or failures) in the order they should happen; every request that
//! comes through is recorded so tests can count attempts and inspect headers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::client::{RetryConfig, RetryingHttpClient};
use super::{HttpRequest, HttpResponse, Transport, TransportFailure};
use crate::provider::{Credentials, ProviderProfile};
use crate::redact::Redactor;

enum Line {
    Respond(StatusCode, Vec<u8>),
    Fail(String),
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Line>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport").finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond_json(&self, status: u16, body: Value) -> &Self {
        let status = StatusCode::from_u16(status).expect("💀 test used a status code from another universe");
        self.push(Line::Respond(status, body.to_string().into_bytes()))
    }

    pub(crate) fn respond_bytes(&self, status: u16, body: &[u8]) -> &Self {
        let status = StatusCode::from_u16(status).expect("💀 test used a status code from another universe");
        self.push(Line::Respond(status, body.to_vec()))
    }

    pub(crate) fn fail(&self, message: &str) -> &Self {
        self.push(Line::Fail(message.to_string()))
    }

    pub(crate) fn fail_times(&self, times: usize) -> &Self {
        for attempt in 0..times {
            self.fail(&format!("connection refused (scripted #{attempt})"));
        }
        self
    }

    /// 📋 Every request seen so far, in order.
    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().expect("💀 poisoned test mutex").clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.seen.lock().expect("💀 poisoned test mutex").len()
    }

    fn push(&self, line: Line) -> &Self {
        self.script.lock().expect("💀 poisoned test mutex").push_back(line);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        self.seen
            .lock()
            .expect("💀 poisoned test mutex")
            .push(request.clone());
        let line = self.script.lock().expect("💀 poisoned test mutex").pop_front();
        match line {
            Some(Line::Respond(status, body)) => Ok(HttpResponse::for_request(request, status, body)),
            Some(Line::Fail(message)) => Err(TransportFailure(message)),
            None => Err(TransportFailure(format!(
                "script ran out of lines at {} {}",
                request.method, request.url
            ))),
        }
    }
}

/// 🧪 A client over a scripted transport, rooted at `https://api.example.test/v1`.
pub(crate) fn client_over(transport: Arc<ScriptedTransport>, retry: RetryConfig) -> RetryingHttpClient {
    let profile = ProviderProfile {
        base_url: "https://api.example.test/v1".into(),
        ..ProviderProfile::default()
    };
    RetryingHttpClient::new(
        &profile,
        &Credentials::new("tok"),
        retry,
        transport,
        Redactor::default(),
    )
}
