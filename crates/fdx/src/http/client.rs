//! 🔄 RetryingHttpClient: the one place that knows the base URL, the token, and when to try again.
//!
//! 🧠 Knowledge graph:
//! - GET is retried when the transport produced *no response*. Immediately. No backoff, no jitter.
//! - POST/PATCH go out once. Writes are not idempotent and we are not gamblers.
//! - A 4xx/5xx is a response. It is logged, handed back, and never retried.
//! - Exhausting the retry budget either raises `TransportExhausted` or quietly returns `None`,
//!   depending on `fail_silently`. Both are supported. Pick your poison in config.
//!
//! "He who retries a POST, creates two invoices." — Ancient billing proverb 📜

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{HttpMethod, HttpRequest, HttpResponse, QueryParams, RequestBody, Transport};
use crate::error::{FdxError, Result};
use crate::provider::{Credentials, ProviderProfile};
use crate::redact::Redactor;

/// 🔄 How hard to try when the network ghosts us.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// 🔄 Extra GET attempts after the first one. 0 = one shot only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 🤫 On exhaustion: `true` returns no result, `false` raises `TransportExhausted`.
    #[serde(default)]
    pub fail_silently: bool,
}

// 🔄 One retry. Optimistic, but not delusional.
fn default_max_retries() -> u32 {
    1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            fail_silently: false,
        }
    }
}

/// 📦 Everything a write request can carry besides its target.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub params: QueryParams,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestParts {
    pub fn json(body: Value) -> Self {
        Self {
            body: RequestBody::Json(body),
            ..Self::default()
        }
    }

    pub fn with_params(params: QueryParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }
}

/// 📡 HTTP client with auth, base-URL resolution, and a GET-only retry policy.
///
/// `Send + Sync`; share it through an `Arc`. It holds no per-read state, so any number of
/// readers can use it at once. Cursor state belongs to the readers.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    authorization: String,
    accept: Option<String>,
    retry: RetryConfig,
    redactor: Redactor,
}

impl RetryingHttpClient {
    pub fn new(
        profile: &ProviderProfile,
        credentials: &Credentials,
        retry: RetryConfig,
        transport: Arc<dyn Transport>,
        redactor: Redactor,
    ) -> Self {
        Self {
            transport,
            base_url: profile.base_url.trim_end_matches('/').to_string(),
            authorization: profile.auth_scheme.header_value(credentials),
            accept: profile.accept.clone(),
            retry,
            redactor,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// 🔗 Relative endpoint → `{base_url}/{endpoint}`. Absolute `http(s)://` URLs pass through as-is.
    pub fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}/{}", self.base_url, target.trim_start_matches('/'))
        }
    }

    fn request(&self, method: HttpMethod, target: &str, parts: RequestParts) -> HttpRequest {
        let mut request = HttpRequest::new(method, self.resolve_url(target));
        request.query = parts.params;
        request
            .headers
            .push(("Authorization".to_string(), self.authorization.clone()));
        if let Some(accept) = &self.accept {
            request.headers.push(("Accept".to_string(), accept.clone()));
        }
        request.headers.extend(parts.headers);
        request.body = parts.body;
        request
    }

    /// 📡 GET with retries. `Ok(None)` only when retries ran out and `fail_silently` is on.
    pub async fn get(&self, target: &str, params: &QueryParams) -> Result<Option<HttpResponse>> {
        let request = self.request(
            HttpMethod::Get,
            target,
            RequestParts::with_params(params.clone()),
        );
        // 🔢 Per-request counter. Born here, dies here, never shared.
        let mut retries_used: u32 = 0;
        loop {
            info!(
                "📡 GET {} params={:?}",
                request.url,
                self.redactor.params(&request.query)
            );
            match self.transport.send(&request).await {
                Ok(response) => {
                    self.log_response(&response);
                    return Ok(Some(response));
                }
                Err(failure) => {
                    error!("💀 GET {} got no response: {}", request.url, failure);
                    if retries_used >= self.retry.max_retries {
                        let attempts = retries_used + 1;
                        error!("💀 Max number of retries reached ({attempts} attempt(s)) for {}", request.url);
                        if self.retry.fail_silently {
                            warn!("🤫 fail_silently is on, returning no result for {}", request.url);
                            return Ok(None);
                        }
                        return Err(FdxError::TransportExhausted {
                            method: HttpMethod::Get,
                            url: request.url,
                            attempts,
                            message: failure.to_string(),
                        });
                    }
                    retries_used += 1;
                    warn!(
                        "🔄 Retry {}/{} for {}",
                        retries_used, self.retry.max_retries, request.url
                    );
                }
            }
        }
    }

    /// 🧩 GET, then status check, then JSON. `Ok(None)` mirrors `get`'s silent exhaustion.
    pub async fn get_json(&self, target: &str, params: &QueryParams) -> Result<Option<Value>> {
        match self.get(target, params).await? {
            Some(response) => Ok(Some(response.error_for_status()?.json()?)),
            None => Ok(None),
        }
    }

    /// 📮 POST, exactly once.
    pub async fn post(&self, target: &str, parts: RequestParts) -> Result<HttpResponse> {
        self.send_once(HttpMethod::Post, target, parts).await
    }

    pub async fn post_json(&self, target: &str, parts: RequestParts) -> Result<Value> {
        self.post(target, parts).await?.error_for_status()?.json()
    }

    /// 🩹 PATCH, exactly once.
    pub async fn patch(&self, target: &str, parts: RequestParts) -> Result<HttpResponse> {
        self.send_once(HttpMethod::Patch, target, parts).await
    }

    pub async fn patch_json(&self, target: &str, parts: RequestParts) -> Result<Value> {
        self.patch(target, parts).await?.error_for_status()?.json()
    }

    async fn send_once(&self, method: HttpMethod, target: &str, parts: RequestParts) -> Result<HttpResponse> {
        let request = self.request(method, target, parts);
        info!(
            "📮 {} {} params={:?}",
            method,
            request.url,
            self.redactor.params(&request.query)
        );
        debug!("📨 headers={:?}", request.redacted_headers(&self.redactor));
        if let RequestBody::Json(body) = &request.body {
            debug!("📦 body={}", self.redactor.json(body));
        }
        match self.transport.send(&request).await {
            Ok(response) => {
                self.log_response(&response);
                Ok(response)
            }
            Err(failure) => {
                error!("💀 {} {} got no response: {}", method, request.url, failure);
                Err(FdxError::TransportExhausted {
                    method,
                    url: request.url,
                    attempts: 1,
                    message: failure.to_string(),
                })
            }
        }
    }

    fn log_response(&self, response: &HttpResponse) {
        info!("📬 status_code={} for {} {}", response.status.as_u16(), response.method, response.url);
        if response.status.as_u16() >= 400 {
            let dump = match serde_json::from_slice::<Value>(&response.body) {
                Ok(json) => self.redactor.json(&json).to_string(),
                Err(_) => response.text_lossy(),
            };
            error!("💀 Error {}. Dumping response: {}", response.status.as_u16(), dump);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::scripted::ScriptedTransport;
    use crate::provider::{AuthScheme, ProviderProfile};
    use serde_json::json;

    fn client_with(transport: Arc<ScriptedTransport>, max_retries: u32, fail_silently: bool) -> RetryingHttpClient {
        let profile = ProviderProfile {
            base_url: "https://api.example.test/v1/".into(),
            auth_scheme: AuthScheme::new("Zoho-oauthtoken"),
            accept: Some("application/vnd.api+json".into()),
            ..ProviderProfile::default()
        };
        RetryingHttpClient::new(
            &profile,
            &Credentials::new("tok"),
            RetryConfig {
                max_retries,
                fail_silently,
            },
            transport,
            Redactor::default(),
        )
    }

    #[tokio::test]
    async fn the_one_where_k_failures_and_k_retries_still_win() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_times(3).respond_json(200, json!({"ok": true}));
        let client = client_with(transport.clone(), 3, false);

        let body = client.get_json("things", &QueryParams::new()).await?;
        assert_eq!(body, Some(json!({"ok": true})));
        assert_eq!(transport.request_count(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_one_retry_short_raises_after_exactly_k_attempts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_times(3).respond_json(200, json!({"ok": true}));
        let client = client_with(transport.clone(), 2, false);

        match client.get("things", &QueryParams::new()).await {
            Err(FdxError::TransportExhausted { attempts, method, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(method, HttpMethod::Get);
            }
            other => panic!("💀 expected TransportExhausted, got {:?}", other),
        }
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn the_one_where_fail_silently_shrugs_and_returns_nothing() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_times(3);
        let client = client_with(transport.clone(), 2, true);

        assert!(client.get("things", &QueryParams::new()).await?.is_none());
        assert!(client.get_json("things", &QueryParams::new()).await.is_ok());
        // 🔢 3 attempts for the first call; the second call starts a fresh counter.
        assert_eq!(transport.request_count(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_500_is_returned_not_retried() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(500, json!({"code": "INTERNAL"}));
        let client = client_with(transport.clone(), 5, false);

        let response = client
            .get("things", &QueryParams::new())
            .await?
            .expect("💀 a 500 is still a response");
        assert_eq!(response.status.as_u16(), 500);
        assert_eq!(transport.request_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_get_json_refuses_to_pretend_a_404_is_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(404, json!({"errors": []}));
        let client = client_with(transport, 1, true);

        let result = client.get_json("things", &QueryParams::new()).await;
        assert!(matches!(result, Err(FdxError::Remote { status: 404, .. })));
    }

    #[tokio::test]
    async fn the_one_where_posts_are_one_and_done() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("connection reset").respond_json(200, json!({}));
        let client = client_with(transport.clone(), 5, true);

        let result = client.post("things", RequestParts::json(json!({"a": 1}))).await;
        assert!(matches!(
            result,
            Err(FdxError::TransportExhausted { attempts: 1, method: HttpMethod::Post, .. })
        ));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn the_one_where_headers_and_urls_come_out_right() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond_json(200, json!({}))
            .respond_json(200, json!({}));
        let client = client_with(transport.clone(), 0, false);

        client.get("/files/me/files", &QueryParams::new()).await?;
        client
            .patch_json("https://elsewhere.test/raw", RequestParts::json(json!({"x": 1})))
            .await?;

        let seen = transport.requests();
        assert_eq!(seen[0].url, "https://api.example.test/v1/files/me/files");
        assert_eq!(seen[0].header("Authorization"), Some("Zoho-oauthtoken tok"));
        assert_eq!(seen[0].header("Accept"), Some("application/vnd.api+json"));
        assert_eq!(seen[1].url, "https://elsewhere.test/raw");
        assert_eq!(seen[1].method, HttpMethod::Patch);
        assert_eq!(seen[1].body, RequestBody::Json(json!({"x": 1})));
        Ok(())
    }
}
