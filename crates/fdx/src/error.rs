//! 💀 The error taxonomy: every way a remote API can ruin your afternoon, typed.
//!
//! 🧠 Knowledge graph:
//! - `TransportExhausted`: no response at all (DNS, refused, timeout). The only retryable kind.
//! - `Remote`: the server answered, with status >= 400. Never retried. Surfaced as-is.
//! - `PathNotFound`: a path segment had no matching child during resolution.
//! - `UploadSession`: any phase of the chunked upload protocol gave up.
//! - `Decode` / `Config`: the boring-but-honest bookends.
//!
//! 🦆 The duck has filed a complaint about status 418. It was not retried either.

use thiserror::Error;

use crate::drive::upload::UploadPhase;
use crate::http::HttpMethod;

/// 💀 Everything that can go wrong inside fdx, sorted into bins callers can `match` on.
#[derive(Debug, Error)]
pub enum FdxError {
    /// 📡 No response ever arrived: after `attempts` tries, the wire stayed silent.
    #[error("💀 {method} {url} produced no response after {attempts} attempt(s): {message}")]
    TransportExhausted {
        method: HttpMethod,
        url: String,
        attempts: u32,
        message: String,
    },

    /// 🚫 The server answered, and the answer was no.
    #[error("💀 {method} {url} answered HTTP {status}: {body}")]
    Remote {
        method: HttpMethod,
        url: String,
        status: u16,
        body: String,
    },

    /// 🔍 A path segment went looking for its folder and came home empty-handed.
    #[error("🔍 Path element '{segment}' not found while resolving '{path}'")]
    PathNotFound { segment: String, path: String },

    /// 📦 The chunked upload fell over mid-flight. No resume, no refunds.
    #[error("💀 Upload session failed during {phase}: {message}")]
    UploadSession { phase: UploadPhase, message: String },

    /// 🧩 The bytes arrived, but they were not the shape we were promised.
    #[error("💀 Could not decode {context}: {message}")]
    Decode { context: String, message: String },

    /// 🔧 The configuration asked for something that doesn't exist.
    #[error("🔧 Invalid configuration: {0}")]
    Config(String),
}

impl FdxError {
    /// 🔍 True when this error means "the thing you asked for isn't there".
    pub fn is_not_found(&self) -> bool {
        matches!(self, FdxError::PathNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, FdxError>;
