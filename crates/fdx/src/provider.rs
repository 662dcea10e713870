//! 🏷️ Provider profiles: "which API, which pagination, which auth header" as plain data.
//!
//! The core never branches on *who* the provider is. The caller picks an `EndpointFamily`,
//! the config hands back a `ProviderProfile`, and everything downstream just reads fields.
//! Two families ship with defaults (records-style and files-style); both are overridable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::paging::PagingConfig;

/// 🔒 An already-valid access token. Acquiring or refreshing it is somebody else's job.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(transparent)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }
}

// 🔒 Never, ever print the token. Not even in debug builds. Especially not in debug builds.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &if self.is_empty() { "<empty>" } else { "********" })
            .finish()
    }
}

/// 🔑 The word that goes before the token in `Authorization:`. `Bearer`, `Zoho-oauthtoken`, ...
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct AuthScheme(String);

impl AuthScheme {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self(scheme.into())
    }

    pub fn header_value(&self, credentials: &Credentials) -> String {
        format!("{} {}", self.0, credentials.token())
    }
}

impl Default for AuthScheme {
    fn default() -> Self {
        Self::new("Bearer")
    }
}

/// 🎛️ Records-style API (flat rows) or files-style API (folders and files).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndpointFamily {
    Records,
    #[default]
    Files,
}

impl fmt::Display for EndpointFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointFamily::Records => f.write_str("records"),
            EndpointFamily::Files => f.write_str("files"),
        }
    }
}

/// 📦 `{base_url, paging, auth_scheme, accept}`: everything that differs between two APIs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderProfile {
    pub base_url: String,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub auth_scheme: AuthScheme,
    #[serde(default)]
    pub accept: Option<String>,
}

impl Default for ProviderProfile {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            paging: PagingConfig::default(),
            auth_scheme: AuthScheme::default(),
            accept: None,
        }
    }
}

impl ProviderProfile {
    /// 📇 Records API defaults: CRM v7, page-token envelope, Zoho-style auth header.
    pub fn records_defaults() -> Self {
        Self {
            base_url: "https://www.zohoapis.com/crm/v7".to_string(),
            paging: PagingConfig::page_token(),
            auth_scheme: AuthScheme::new("Zoho-oauthtoken"),
            accept: Some("application/vnd.api+json".to_string()),
        }
    }

    /// 🗂️ Files API defaults: WorkDrive v1, offset/limit pages of 50.
    pub fn files_defaults() -> Self {
        Self {
            base_url: "https://www.zohoapis.com/workdrive/api/v1".to_string(),
            paging: PagingConfig::offset_limit(50),
            auth_scheme: AuthScheme::new("Zoho-oauthtoken"),
            accept: Some("application/vnd.api+json".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_the_token_stays_out_of_the_logs() {
        let shown = format!("{:?}", Credentials::new("1000.deadbeef"));
        assert!(!shown.contains("deadbeef"));
        assert!(format!("{:?}", Credentials::default()).contains("<empty>"));
    }

    #[test]
    fn the_one_where_the_auth_header_is_assembled_from_parts() {
        let scheme = AuthScheme::new("Zoho-oauthtoken");
        assert_eq!(
            scheme.header_value(&Credentials::new("abc")),
            "Zoho-oauthtoken abc"
        );
        assert_eq!(
            AuthScheme::default().header_value(&Credentials::new("abc")),
            "Bearer abc"
        );
    }

    #[test]
    fn the_one_where_a_profile_deserializes_with_paging_defaults() {
        let profile: ProviderProfile = serde_json::from_str(
            r#"{"base_url": "https://api.test", "paging": {"offset_limit": {"batch_size": 2}}}"#,
        )
        .expect("💀 profile should parse");
        assert_eq!(profile.paging, PagingConfig::offset_limit(2));
        assert_eq!(profile.auth_scheme, AuthScheme::default());
        assert!(profile.accept.is_none());
    }
}
