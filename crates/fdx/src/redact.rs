//! 🔒 Redactor: the bouncer that checks log lines for secrets before they hit the terminal.
//!
//! Every component that logs request parameters, bodies or config gets one of these at
//! construction. No global registry, no static filter list. Clone it, hand it over, done.
//! It is a list of key names and nothing else, so cloning costs one `Arc` bump.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

const MASK: &str = "********";

/// 🔒 Key names that are always treated as secret, whatever the config says.
const DEFAULT_SECRET_KEYS: &[&str] = &[
    "password",
    "access_token",
    "token",
    "zoho_oauth",
    "authorization",
];

/// 🔒 Masks values whose key names look secret. Matching is case-insensitive and exact.
#[derive(Debug, Clone)]
pub struct Redactor {
    secret_keys: Arc<[String]>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl Redactor {
    /// 🚀 Builds a redactor from extra key names, on top of the built-in list.
    pub fn new<I, S>(extra_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = DEFAULT_SECRET_KEYS.iter().map(|k| k.to_string()).collect();
        for key in extra_keys {
            let key = key.into().to_ascii_lowercase();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self {
            secret_keys: keys.into(),
        }
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.secret_keys
            .iter()
            .any(|secret| secret.eq_ignore_ascii_case(key))
    }

    /// 🧹 Query params, log-ready.
    pub fn params<'a>(&self, params: &'a BTreeMap<String, String>) -> BTreeMap<&'a str, &'a str> {
        params
            .iter()
            .map(|(k, v)| {
                let shown = if self.is_secret(k) { MASK } else { v.as_str() };
                (k.as_str(), shown)
            })
            .collect()
    }

    /// 🧹 Header value, log-ready.
    pub fn header<'a>(&self, name: &str, value: &'a str) -> &'a str {
        if self.is_secret(name) { MASK } else { value }
    }

    /// 🧹 Walks a JSON tree and masks every value sitting under a secret key.
    pub fn json(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let shown = if self.is_secret(k) {
                            Value::String(MASK.to_string())
                        } else {
                            self.json(v)
                        };
                        (k.clone(), shown)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.json(v)).collect()),
            other => other.clone(),
        }
    }
}
