//! Suggestion service: proposing replacement locators from page markup.
//!
//! The service is best-effort, non-deterministic, and untrusted: the
//! resolver always re-verifies a candidate against the page probe before
//! using or persisting it. Exactly one suggestion call is made per
//! resolution attempt; there is no multi-round negotiation.
//!
//! [`LlmSuggester`] (feature `llm`) talks to any server exposing the OpenAI
//! `/v1/chat/completions` API. [`StaticSuggester`] is always available for
//! tests and offline runs.

use crate::result::SanarResult;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Mutex;

/// A service proposing a replacement selector for a stale locator.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Propose a replacement selector for `element_name` given the current
    /// page markup and the selector that just failed verification.
    ///
    /// `Ok(None)` means "no usable candidate". Errors are reserved for the
    /// service being unreachable or misbehaving at the transport level.
    async fn suggest(
        &self,
        markup: &str,
        element_name: &str,
        prior_selector: &str,
    ) -> SanarResult<Option<String>>;
}

/// Extract a selector candidate from free-form model output.
///
/// Tried in order: a double-quoted string, a `locator = ...` /
/// `selector: ...` tail, then a bare single-line answer. Returns `None`
/// when nothing usable survives trimming.
#[must_use]
pub fn extract_candidate(response: &str) -> Option<String> {
    let cleaned = response.trim().trim_matches('`').trim();
    if cleaned.is_empty() {
        return None;
    }

    // Quoted string, the shape the repair prompt asks for
    let quoted = Regex::new(r#""([^"]+)""#).ok()?;
    if let Some(m) = quoted.captures(cleaned) {
        let candidate = m[1].trim();
        if !candidate.is_empty() {
            return Some(candidate.to_string());
        }
    }

    // locator = <value> / selector: <value>
    let assigned = Regex::new(r"(?mi)(?:locator|selector)\s*[=:]\s*(\S.*)$").ok()?;
    if let Some(m) = assigned.captures(cleaned) {
        let candidate = m[1].trim().trim_matches('`').trim_matches('\'');
        if !candidate.is_empty() {
            return Some(candidate.to_string());
        }
    }

    // A bare one-line answer is taken as-is; prose is not.
    if !cleaned.contains('\n') && !cleaned.contains(' ') {
        return Some(cleaned.to_string());
    }
    None
}

/// A pre-programmed suggester for tests and offline runs.
///
/// Records every call so tests can assert the single-call contract.
#[derive(Debug, Default)]
pub struct StaticSuggester {
    candidate: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticSuggester {
    /// Always suggest the given candidate.
    #[must_use]
    pub fn suggesting(candidate: impl Into<String>) -> Self {
        Self {
            candidate: Some(candidate.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Never suggest anything.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// (element name, prior selector) pairs of the calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionService for StaticSuggester {
    async fn suggest(
        &self,
        _markup: &str,
        element_name: &str,
        prior_selector: &str,
    ) -> SanarResult<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((element_name.to_string(), prior_selector.to_string()));
        Ok(self.candidate.clone())
    }
}

#[cfg(feature = "llm")]
pub use llm::{LlmSuggester, SuggesterConfig};

#[cfg(feature = "llm")]
mod llm {
    use super::{extract_candidate, SuggestionService};
    use crate::result::{SanarError, SanarResult};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tracing::{debug, info};

    /// Chat message role.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        /// System prompt
        System,
        /// User message
        User,
        /// Assistant response
        Assistant,
    }

    /// A single chat message.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ChatMessage {
        /// The role of the message author.
        pub role: Role,
        /// The content of the message.
        pub content: String,
    }

    #[derive(Debug, Clone, Serialize)]
    struct ChatRequest {
        model: String,
        messages: Vec<ChatMessage>,
        temperature: f64,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ChatResponseChoice {
        message: ChatMessage,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatResponseChoice>,
    }

    /// Configuration for the OpenAI-compatible suggestion endpoint.
    #[derive(Debug, Clone)]
    pub struct SuggesterConfig {
        /// Base URL of the API server (e.g., `https://api.openai.com`)
        pub base_url: String,
        /// Model identifier
        pub model: String,
        /// Bearer token, if the endpoint requires one
        pub api_key: Option<String>,
        /// Request timeout
        pub timeout: Duration,
    }

    impl SuggesterConfig {
        /// Create a config for the given endpoint and model.
        #[must_use]
        pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                model: model.into(),
                api_key: None,
                timeout: Duration::from_secs(60),
            }
        }

        /// Set the API key
        #[must_use]
        pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
            self.api_key = Some(key.into());
            self
        }

        /// Set the request timeout
        #[must_use]
        pub const fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }
    }

    /// OpenAI-compatible suggestion service.
    ///
    /// Sends one chat-completion request per resolution attempt and extracts
    /// a selector candidate from the reply. Transport failures surface as
    /// [`SanarError::ServiceUnavailable`].
    #[derive(Debug, Clone)]
    pub struct LlmSuggester {
        config: SuggesterConfig,
        client: reqwest::Client,
    }

    impl LlmSuggester {
        /// Create a suggester for the given endpoint.
        pub fn new(config: SuggesterConfig) -> SanarResult<Self> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| SanarError::config(format!("HTTP client: {e}")))?;
            Ok(Self { config, client })
        }

        /// Returns the configured endpoint base URL.
        #[must_use]
        pub fn base_url(&self) -> &str {
            &self.config.base_url
        }

        fn build_prompt(markup: &str, element_name: &str, prior_selector: &str) -> String {
            format!(
                "A UI test could not find the element named '{element_name}' using the \
                 selector '{prior_selector}'. From the page markup below, pick the most \
                 robust CSS or XPath selector that matches exactly one visible element \
                 for '{element_name}'. Reply with the selector only, in the form \
                 locator = \"<selector>\".\n\n{markup}"
            )
        }

        async fn complete(&self, prompt: String) -> SanarResult<String> {
            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: vec![
                    ChatMessage {
                        role: Role::System,
                        content: "You repair stale UI test locators.".to_string(),
                    },
                    ChatMessage {
                        role: Role::User,
                        content: prompt,
                    },
                ],
                temperature: 0.0,
            };

            let url = format!("{}/v1/chat/completions", self.config.base_url);
            let mut req = self.client.post(&url).json(&request);
            if let Some(ref key) = self.config.api_key {
                req = req.bearer_auth(key);
            }

            let resp = req.send().await.map_err(|e| SanarError::ServiceUnavailable {
                message: e.to_string(),
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(SanarError::ServiceUnavailable {
                    message: format!("API error {status}: {body}"),
                });
            }

            let response: ChatResponse =
                resp.json().await.map_err(|e| SanarError::ServiceUnavailable {
                    message: format!("malformed response: {e}"),
                })?;

            response
                .choices
                .first()
                .map(|c| c.message.content.trim().to_string())
                .ok_or_else(|| SanarError::ServiceUnavailable {
                    message: "response contained no choices".to_string(),
                })
        }
    }

    #[async_trait]
    impl SuggestionService for LlmSuggester {
        async fn suggest(
            &self,
            markup: &str,
            element_name: &str,
            prior_selector: &str,
        ) -> SanarResult<Option<String>> {
            debug!(element = element_name, endpoint = %self.config.base_url, "requesting locator suggestion");
            let prompt = Self::build_prompt(markup, element_name, prior_selector);
            let reply = self.complete(prompt).await?;
            let candidate = extract_candidate(&reply);
            info!(
                element = element_name,
                candidate = candidate.as_deref().unwrap_or("<none>"),
                "suggestion received"
            );
            Ok(candidate)
        }
    }

}
