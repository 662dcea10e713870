//! 🔧 App Configuration: one TOML file, a pile of `FDX_*` env vars, one struct.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment. Nested keys come from env with a double underscore:
//! `FDX_CONNECTION__ACCESS_TOKEN`, `FDX_RETRY__MAX_RETRIES`, `FDX_DRIVE__ROOT_PATH`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::drive::{DriveConfig, DriveFs};
use crate::endpoint::EndpointDescriptor;
use crate::error::{FdxError, Result};
use crate::http::reqwest_transport::HttpConfig;
use crate::http::{ReqwestTransport, RetryConfig, RetryingHttpClient};
use crate::provider::{Credentials, EndpointFamily, ProviderProfile};
use crate::redact::Redactor;
use crate::rows::{RowLimit, RowReader};
use crate::tables::TableCatalog;

/// 🔑 The token and, optionally, which API family to aim it at.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ConnectionConfig {
    pub access_token: Credentials,
    /// 🎛️ Unset = each operation uses its natural family (records for rows, files for drive).
    pub family: Option<EndpointFamily>,
}

/// 🏷️ One profile per endpoint family. Each is replaced wholesale when configured.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProfilesConfig {
    #[serde(default = "ProviderProfile::records_defaults")]
    pub records: ProviderProfile,
    #[serde(default = "ProviderProfile::files_defaults")]
    pub files: ProviderProfile,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            records: ProviderProfile::records_defaults(),
            files: ProviderProfile::files_defaults(),
        }
    }
}

/// 🔒 Extra key names to mask in logs, on top of the built-in ones.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub secret_keys: Vec<String>,
}

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
///
/// Every section has defaults, so an empty file (plus a token) is a working config.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub profiles: ProfilesConfig,
    pub drive: DriveConfig,
    /// 📇 Extra (or overriding) named tables for the records family.
    pub tables: BTreeMap<String, EndpointDescriptor>,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn profile(&self, family: EndpointFamily) -> &ProviderProfile {
        match family {
            EndpointFamily::Records => &self.profiles.records,
            EndpointFamily::Files => &self.profiles.files,
        }
    }

    pub fn redactor(&self) -> Redactor {
        Redactor::new(self.logging.secret_keys.iter().cloned())
    }

    pub fn table_catalog(&self) -> TableCatalog {
        TableCatalog::with_overrides(&self.tables)
    }

    /// 🔒 The whole config as JSON with every secret masked. Log-safe.
    pub fn redacted_dump(&self) -> String {
        match serde_json::to_value(self) {
            Ok(value) => self.redactor().json(&value).to_string(),
            Err(e) => format!("<unserializable config: {e}>"),
        }
    }

    /// 📡 A shared client for `family`, over a fresh pooled reqwest transport.
    pub fn client(&self, family: EndpointFamily) -> anyhow::Result<Arc<RetryingHttpClient>> {
        if self.connection.access_token.is_empty() {
            return Err(FdxError::Config(
                "connection.access_token is empty (set FDX_CONNECTION__ACCESS_TOKEN)".to_string(),
            ))
            .context("💀 No token, no API. Acquiring one is out of scope; bringing one is not.");
        }
        let transport = ReqwestTransport::new(&self.http)?;
        Ok(Arc::new(RetryingHttpClient::new(
            self.profile(family),
            &self.connection.access_token,
            self.retry.clone(),
            Arc::new(transport),
            self.redactor(),
        )))
    }

    /// 🎛️ The configured family, or `fallback` when the config leaves it open.
    pub fn family_or(&self, fallback: EndpointFamily) -> EndpointFamily {
        self.connection.family.unwrap_or(fallback)
    }

    /// 🚰 A reader for a named table, paged the way `family`'s profile says.
    pub fn rows(
        &self,
        client: Arc<RetryingHttpClient>,
        family: EndpointFamily,
        table: &str,
        limit: RowLimit,
    ) -> Result<RowReader> {
        self.table_catalog()
            .reader(table, client, &self.profile(family).paging, limit)
    }

    /// 🗄️ The drive facade; folder listings are paged per `family`'s profile.
    pub fn drive(&self, client: Arc<RetryingHttpClient>, family: EndpointFamily) -> Result<DriveFs> {
        DriveFs::new(client, self.profile(family).paging.clone(), self.drive.clone())
    }
}

/// 🚀 Load the config from env vars and, if given, a TOML file on top.
///
/// 📐 `None` → env vars only. `Some(path)` → env vars + TOML file, merged; TOML wins on
/// conflicts. A missing file is not an error (Figment treats it as empty), an unparseable
/// one is.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("FDX_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (FDX_*). \
             The file exists in our hearts, but apparently not in valid TOML.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (FDX_*). \
                 No file was given, so the environment is the only suspect."
            .to_string(),
    };

    let app_config: AppConfig = config.extract().context(context_msg)?;
    debug!("🔧 Effective configuration: {}", app_config.redacted_dump());
    Ok(app_config)
}
