//! 📡 The production transport: one pooled `reqwest::Client`, zero retries, zero opinions.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportFailure};

// Lives next to the transport it configures, not in app_config. Ethos.
/// ⏱️ Connect/read timeouts. The only timeouts this crate has; the rest is up to the server.
///
/// `read_timeout_secs` bounds the wait between two reads, not the whole exchange, so a
/// half-gigabyte upload or download can take as long as it needs while bytes keep moving.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

// ⏱️ 10 seconds to shake hands. If the server can't manage that, it's not having a good day.
fn default_connect_timeout_secs() -> u64 {
    10
}

// ⏱️ 30 seconds of silence on an open connection and we call it.
fn default_read_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

/// 📡 `Transport` over reqwest. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 🚀 Builds the pooled client with the configured timeouts.
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. Probably TLS. It's always TLS.")?;
        Ok(Self { client })
    }

    /// 🔗 Glues the query map onto the URL. Existing query pairs on the URL are kept.
    fn full_url(request: &HttpRequest) -> std::result::Result<Url, TransportFailure> {
        let mut url = Url::parse(&request.url)
            .map_err(|e| TransportFailure(format!("invalid URL '{}': {e}", request.url)))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportFailure> {
        let url = Self::full_url(request)?;
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Patch => self.client.patch(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let encoded = serde_json::to_vec(value)
                    .map_err(|e| TransportFailure(format!("could not encode JSON body: {e}")))?;
                let builder = if request.header("content-type").is_none() {
                    builder.header("Content-Type", "application/json")
                } else {
                    builder
                };
                builder.body(encoded)
            }
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;
        let status = response.status();
        let headers = response.headers().clone();
        // 📦 A body that dies halfway is as good as no response at all.
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure(format!("response body interrupted: {e}")))?;
        trace!("📬 {} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        let mut out = HttpResponse::for_request(request, status, body.to_vec());
        out.headers = headers;
        Ok(out)
    }
}
