//! 📦 ChunkedUploader: small files in one shot, big files in a create/append/commit session.
//!
//! 🧠 Knowledge graph:
//! - `payload < threshold`: a single POST of the whole body to the stream-upload URL.
//! - Otherwise the session protocol:
//!   1. **create**: POST `uploadsession/create?size&file_name&parent_id` → `upload_id`, `chunk_size`
//!   2. **append**: one POST per chunk, `Content-Range: bytes {start} - {end}/{total}`, `end` exclusive
//!   3. **commit**: POST `uploadsession/commit?upload-id&parent_id`
//! - Any failure in any phase ends it right there. No resume, no cleanup call. The server
//!   garbage-collects abandoned sessions on its own schedule.
//!
//! ⚠️ Writes go through the client exactly once each. Retrying an append would duplicate bytes.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{FdxError, Result};
use crate::http::{QueryParams, RequestBody, RequestParts, RetryingHttpClient};

/// 📦 Which step of the session protocol was running when things went sideways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Create,
    Append,
    Commit,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadPhase::Create => f.write_str("create"),
            UploadPhase::Append => f.write_str("append"),
            UploadPhase::Commit => f.write_str("commit"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// 📏 At or above this many bytes, the session protocol kicks in. 1 GiB by default.
    pub session_threshold_bytes: u64,
    pub stream_upload_url: String,
    pub create_endpoint: String,
    pub commit_endpoint: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            session_threshold_bytes: 1_073_741_824,
            stream_upload_url: "https://upload.zoho.com/workdrive-api/v1/stream/upload".to_string(),
            create_endpoint: "uploadsession/create".to_string(),
            commit_endpoint: "uploadsession/commit".to_string(),
        }
    }
}

/// 🏁 How the bytes got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Streamed { bytes: u64 },
    Committed { upload_id: String, chunks: usize, bytes: u64 },
}

/// ✂️ Contiguous `[start, end)` ranges of at most `chunk_size` covering `[0, total)`.
///
/// Empty when `total` or `chunk_size` is zero.
pub fn chunk_ranges(total: usize, chunk_size: usize) -> impl Iterator<Item = Range<usize>> {
    let step = chunk_size.max(1);
    let count = if chunk_size == 0 { 0 } else { total.div_ceil(step) };
    (0..count).map(move |i| {
        let start = i * step;
        start..(start + step).min(total)
    })
}

#[derive(Debug, Clone)]
pub struct ChunkedUploader {
    client: Arc<RetryingHttpClient>,
    config: UploadConfig,
}

struct UploadSession {
    upload_id: String,
    chunk_size: usize,
}

impl ChunkedUploader {
    pub fn new(client: Arc<RetryingHttpClient>, config: UploadConfig) -> Self {
        Self { client, config }
    }

    /// 📤 Chunks are `Bytes` slices of `payload`, so the body is never copied per request.
    pub async fn upload(
        &self,
        parent_id: &str,
        file_name: &str,
        payload: impl Into<Bytes>,
    ) -> Result<UploadOutcome> {
        let payload = payload.into();
        let total = payload.len() as u64;
        info!(
            "📦 uploading '{}' ({} bytes) into {}",
            file_name, total, parent_id
        );
        if total < self.config.session_threshold_bytes {
            return self.stream_upload(parent_id, file_name, payload).await;
        }
        self.session_upload(parent_id, file_name, payload).await
    }

    async fn stream_upload(&self, parent_id: &str, file_name: &str, payload: Bytes) -> Result<UploadOutcome> {
        let bytes = payload.len() as u64;
        let parts = RequestParts {
            headers: vec![
                ("x-filename".to_string(), file_name.to_string()),
                ("x-parent_id".to_string(), parent_id.to_string()),
                ("x-streammode".to_string(), "1".to_string()),
                ("Content-Type".to_string(), "text/plain".to_string()),
            ],
            body: RequestBody::Bytes(payload),
            ..RequestParts::default()
        };
        self.client
            .post(&self.config.stream_upload_url, parts)
            .await?
            .error_for_status()?;
        Ok(UploadOutcome::Streamed { bytes })
    }

    async fn session_upload(&self, parent_id: &str, file_name: &str, payload: Bytes) -> Result<UploadOutcome> {
        let total = payload.len();
        let session = self.create(parent_id, file_name, total).await?;
        info!(
            "📦 upload session {} opened, chunk_size={}",
            session.upload_id, session.chunk_size
        );

        let mut chunks = 0;
        for range in chunk_ranges(total, session.chunk_size) {
            debug!(
                "📦 append bytes {} - {}/{} to {}",
                range.start, range.end, total, session.upload_id
            );
            let parts = RequestParts {
                headers: vec![
                    ("upload-id".to_string(), session.upload_id.clone()),
                    (
                        "Content-Range".to_string(),
                        format!("bytes {} - {}/{}", range.start, range.end, total),
                    ),
                    ("x-streammode".to_string(), "1".to_string()),
                ],
                body: RequestBody::Bytes(payload.slice(range)),
                ..RequestParts::default()
            };
            self.session_call(UploadPhase::Append, &self.config.stream_upload_url, parts)
                .await?;
            chunks += 1;
        }

        let mut params = QueryParams::new();
        params.insert("upload-id".to_string(), session.upload_id.clone());
        params.insert("parent_id".to_string(), parent_id.to_string());
        self.session_call(
            UploadPhase::Commit,
            &self.config.commit_endpoint,
            RequestParts::with_params(params),
        )
        .await?;
        info!("🏁 upload session {} committed after {} chunk(s)", session.upload_id, chunks);

        Ok(UploadOutcome::Committed {
            upload_id: session.upload_id,
            chunks,
            bytes: total as u64,
        })
    }

    async fn create(&self, parent_id: &str, file_name: &str, total: usize) -> Result<UploadSession> {
        let mut params = QueryParams::new();
        params.insert("size".to_string(), total.to_string());
        params.insert("file_name".to_string(), file_name.to_string());
        params.insert("parent_id".to_string(), parent_id.to_string());
        let body = self
            .session_call(
                UploadPhase::Create,
                &self.config.create_endpoint,
                RequestParts::with_params(params),
            )
            .await?;

        let session_failure = |message: String| FdxError::UploadSession {
            phase: UploadPhase::Create,
            message,
        };
        let upload_id = session_field(&body, "upload_id")
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| session_failure(format!("response has no upload_id: {}", body)))?;
        let chunk_size = session_field(&body, "chunk_size")
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| session_failure(format!("response has no usable chunk_size: {}", body)))?;

        Ok(UploadSession {
            upload_id,
            chunk_size,
        })
    }

    /// 📮 One POST in the session protocol. Every failure becomes `UploadSession { phase }`.
    async fn session_call(&self, phase: UploadPhase, target: &str, parts: RequestParts) -> Result<Value> {
        let wrap = |err: FdxError| FdxError::UploadSession {
            phase,
            message: err.to_string(),
        };
        let response = self.client.post(target, parts).await.map_err(wrap)?;
        let response = response.error_for_status().map_err(wrap)?;
        // 🧩 Append responses are not always JSON; only create needs the body parsed.
        match phase {
            UploadPhase::Create => response.json().map_err(wrap),
            UploadPhase::Append | UploadPhase::Commit => Ok(Value::Null),
        }
    }
}

// 🔍 Top level first, then the JSON:API `data.attributes` envelope.
fn session_field<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).or_else(|| {
        body.get("data")
            .and_then(|d| d.get("attributes"))
            .and_then(|a| a.get(key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryConfig;
    use crate::http::scripted::{ScriptedTransport, client_over};
    use serde_json::json;

    fn uploader(transport: Arc<ScriptedTransport>, threshold: u64) -> ChunkedUploader {
        let client = Arc::new(client_over(transport, RetryConfig::default()));
        ChunkedUploader::new(
            client,
            UploadConfig {
                session_threshold_bytes: threshold,
                stream_upload_url: "https://upload.example.test/stream".into(),
                ..UploadConfig::default()
            },
        )
    }

    #[test]
    fn the_one_where_chunks_tile_the_payload_without_gaps() {
        for (total, chunk) in [(10, 3), (9, 3), (1, 5), (1000, 1), (7, 7)] {
            let ranges: Vec<_> = chunk_ranges(total, chunk).collect();
            assert_eq!(ranges.first().map(|r| r.start), Some(0));
            assert_eq!(ranges.last().map(|r| r.end), Some(total));
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert!(ranges.iter().all(|r| r.len() <= chunk && !r.is_empty()));
        }
        assert_eq!(chunk_ranges(0, 3).count(), 0);
        assert_eq!(chunk_ranges(10, 0).count(), 0);
    }

    #[tokio::test]
    async fn the_one_where_small_files_take_one_request() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(200, json!({"data": [{"id": "new"}]}));
        let outcome = uploader(transport.clone(), 100)
            .upload("P1", "hello.txt", Bytes::from_static(b"hello"))
            .await?;

        assert_eq!(outcome, UploadOutcome::Streamed { bytes: 5 });
        let seen = transport.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://upload.example.test/stream");
        assert_eq!(seen[0].header("x-filename"), Some("hello.txt"));
        assert_eq!(seen[0].header("x-parent_id"), Some("P1"));
        assert_eq!(seen[0].header("x-streammode"), Some("1"));
        assert_eq!(seen[0].body, RequestBody::Bytes(Bytes::from_static(b"hello")));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_big_files_go_create_append_commit() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond_json(200, json!({"upload_id": "U-1", "chunk_size": "4"}))
            .respond_json(200, json!({}))
            .respond_json(200, json!({}))
            .respond_json(200, json!({}))
            .respond_json(200, json!({"data": {"id": "F"}}));
        let outcome = uploader(transport.clone(), 8)
            .upload("P1", "big.bin", Bytes::from_static(b"0123456789"))
            .await?;

        assert_eq!(
            outcome,
            UploadOutcome::Committed {
                upload_id: "U-1".into(),
                chunks: 3,
                bytes: 10
            }
        );
        let seen = transport.requests();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0].url, "https://api.example.test/v1/uploadsession/create");
        assert_eq!(seen[0].query["size"], "10");
        assert_eq!(seen[0].query["file_name"], "big.bin");
        let ranges: Vec<_> = seen[1..4]
            .iter()
            .map(|r| r.header("Content-Range").unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            ranges,
            vec!["bytes 0 - 4/10", "bytes 4 - 8/10", "bytes 8 - 10/10"]
        );
        assert_eq!(seen[3].body, RequestBody::Bytes(Bytes::from_static(b"89")));
        assert_eq!(seen[2].header("upload-id"), Some("U-1"));
        assert_eq!(seen[4].url, "https://api.example.test/v1/uploadsession/commit");
        assert_eq!(seen[4].query["upload-id"], "U-1");
        assert_eq!(seen[4].query["parent_id"], "P1");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_exactly_the_threshold_opens_a_session() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond_json(200, json!({"upload_id": "U-8", "chunk_size": 4}))
            .respond_json(200, json!({}))
            .respond_json(200, json!({}))
            .respond_json(200, json!({"data": {"id": "F"}}));
        let outcome = uploader(transport.clone(), 8)
            .upload("P1", "edge.bin", Bytes::from_static(b"01234567"))
            .await?;

        assert_eq!(
            outcome,
            UploadOutcome::Committed {
                upload_id: "U-8".into(),
                chunks: 2,
                bytes: 8
            }
        );
        let seen = transport.requests();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].url, "https://api.example.test/v1/uploadsession/create");
        assert_eq!(seen[0].query["size"], "8");
        assert_eq!(seen[2].header("Content-Range"), Some("bytes 4 - 8/8"));
        assert_eq!(seen[3].url, "https://api.example.test/v1/uploadsession/commit");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_one_byte_under_the_threshold_is_a_single_stream() -> Result<()> {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(200, json!({"data": [{"id": "F"}]}));
        let outcome = uploader(transport.clone(), 8)
            .upload("P1", "edge.bin", Bytes::from_static(b"0123456"))
            .await?;

        assert_eq!(outcome, UploadOutcome::Streamed { bytes: 7 });
        let seen = transport.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://upload.example.test/stream");
        assert_eq!(seen[0].body, RequestBody::Bytes(Bytes::from_static(b"0123456")));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_failed_append_abandons_the_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .respond_json(200, json!({"data": {"attributes": {"upload_id": "U-2", "chunk_size": 4}}}))
            .respond_json(500, json!({"errors": [{"title": "boom"}]}));
        let result = uploader(transport.clone(), 1).upload("P1", "big.bin", Bytes::from_static(b"0123456789")).await;

        match result {
            Err(FdxError::UploadSession { phase, message }) => {
                assert_eq!(phase, UploadPhase::Append);
                assert!(message.contains("500"));
            }
            other => panic!("💀 expected UploadSession(append), got {:?}", other),
        }
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn the_one_where_a_zero_chunk_size_never_gets_to_append() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_json(200, json!({"upload_id": "U-3", "chunk_size": 0}));
        let result = uploader(transport.clone(), 1).upload("P1", "big.bin", Bytes::from_static(b"0123")).await;

        assert!(matches!(
            result,
            Err(FdxError::UploadSession {
                phase: UploadPhase::Create,
                ..
            })
        ));
        assert_eq!(transport.request_count(), 1);
    }
}
