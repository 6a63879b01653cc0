//! Session settings from a properties file.
//!
//! The configuration surface is a flat key-value file in the
//! `config.properties` style: `key=value` (or `key:value`) lines, `#`/`!`
//! comments, blank lines ignored, whitespace trimmed, later keys overriding
//! earlier ones. Settings are read once at session start and exposed
//! read-only to components; the file path itself is an input, never
//! hard-coded.

use crate::result::{SanarError, SanarResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Immutable key-value session settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    entries: HashMap<String, String>,
}

impl Settings {
    /// Load settings from a properties file.
    pub fn load(path: impl AsRef<Path>) -> SanarResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings = Self::parse(&text);
        debug!(file = %path.display(), keys = settings.len(), "settings loaded");
        Ok(settings)
    }

    /// Parse settings from properties text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let split_at = line.find(['=', ':']);
            if let Some(pos) = split_at {
                let key = line[..pos].trim();
                let value = line[pos + 1..].trim();
                if !key.is_empty() {
                    entries.insert(key.to_string(), value.to_string());
                }
            }
        }
        Self { entries }
    }

    /// Build settings from key-value pairs (for tests and embedding).
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a key with a default.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Look up a key, failing with a configuration error if absent.
    pub fn require(&self, key: &str) -> SanarResult<&str> {
        self.get(key)
            .ok_or_else(|| SanarError::config(format!("missing required setting '{key}'")))
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Application base URL.
    pub fn base_url(&self) -> SanarResult<&str> {
        self.require("base_url")
    }

    /// Login username.
    pub fn username(&self) -> SanarResult<&str> {
        self.require("username")
    }

    /// Login password.
    pub fn password(&self) -> SanarResult<&str> {
        self.require("password")
    }

    /// Project name, if configured.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.get("project")
    }

    /// Suggestion-service endpoint, if configured.
    #[must_use]
    pub fn suggest_endpoint(&self) -> Option<&str> {
        self.get("suggest_endpoint")
    }

    /// Suggestion-service model name.
    #[must_use]
    pub fn suggest_model(&self) -> &str {
        self.get_or("suggest_model", "gpt-4")
    }

    /// Suggestion-service API key, if configured.
    #[must_use]
    pub fn suggest_api_key(&self) -> Option<&str> {
        self.get("suggest_api_key")
    }
}
