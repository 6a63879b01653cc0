//! Page probe abstraction over the browser-automation engine.
//!
//! The resolver talks to live page state exclusively through [`PageProbe`].
//! A probe answers "does this selector match exactly one visible element?"
//! and performs the handful of reads and actions the validation helpers and
//! page objects need. Any bounded waiting for elements to appear belongs to
//! the probe implementation, not to the resolver.
//!
//! The CDP-backed implementation lives in [`crate::cdp`] behind the
//! `browser` feature; [`MockProbe`] is always available for unit testing.

use crate::locator::Selector;
use crate::result::{SanarError, SanarResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Default bounded wait for element verification (5 seconds)
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval while waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Bounded-wait options for probe verification.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Maximum time to wait for a selector to settle
    pub timeout: Duration,
    /// Polling interval while waiting
    pub poll_interval: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl ProbeOptions {
    /// Set the verification timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Abstraction over the browser engine's query/action operations.
///
/// Implementations may poll internally (bounded by [`ProbeOptions`]) before
/// declaring a verification failure. All failures are browser-side errors;
/// "no match" is the `Ok(false)` return of [`PageProbe::verify`], not an
/// error.
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// Whether the selector matches exactly one visible element on the
    /// current page.
    async fn verify(&self, selector: &Selector) -> SanarResult<bool>;

    /// Text content of the first matching element.
    async fn read_text(&self, selector: &Selector) -> SanarResult<String>;

    /// Ordered option labels of the first matching element.
    async fn read_options(&self, selector: &Selector) -> SanarResult<Vec<String>>;

    /// Click the first matching element.
    async fn click(&self, selector: &Selector) -> SanarResult<()>;

    /// Fill the first matching element with text.
    async fn fill(&self, selector: &Selector, text: &str) -> SanarResult<()>;

    /// Serialized markup of the current page, used as suggestion context.
    async fn capture_markup(&self) -> SanarResult<String>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> SanarResult<Vec<u8>> {
        Err(SanarError::Unsupported {
            operation: "screenshot".to_string(),
        })
    }
}

/// In-memory probe for unit testing.
///
/// Scripted per-selector visible-match counts, texts, and option lists, plus
/// a call history for verifying interactions.
#[derive(Debug, Default)]
pub struct MockProbe {
    matches: Mutex<HashMap<String, usize>>,
    texts: Mutex<HashMap<String, String>>,
    options: Mutex<HashMap<String, Vec<String>>>,
    markup: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MockProbe {
    /// Create a new mock probe with no matches scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page markup returned by `capture_markup`.
    #[must_use]
    pub fn with_markup(self, markup: impl Into<String>) -> Self {
        *self.markup.lock().unwrap() = markup.into();
        self
    }

    /// Script the number of visible matches for a selector.
    pub fn set_matches(&self, selector: impl Into<String>, count: usize) {
        self.matches.lock().unwrap().insert(selector.into(), count);
    }

    /// Script the text content read for a selector.
    pub fn set_text(&self, selector: impl Into<String>, text: impl Into<String>) {
        self.texts.lock().unwrap().insert(selector.into(), text.into());
    }

    /// Script the option labels read for a selector.
    pub fn set_options(&self, selector: impl Into<String>, options: Vec<String>) {
        self.options.lock().unwrap().insert(selector.into(), options);
    }

    /// Calls made against this probe, in order.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }

    /// Whether a method was called (prefix match on the recorded call).
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        self.history.lock().unwrap().push(call);
    }

    fn match_count(&self, selector: &Selector) -> usize {
        self.matches
            .lock()
            .unwrap()
            .get(selector.as_str())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PageProbe for MockProbe {
    async fn verify(&self, selector: &Selector) -> SanarResult<bool> {
        self.record(format!("verify:{}", selector.as_str()));
        Ok(self.match_count(selector) == 1)
    }

    async fn read_text(&self, selector: &Selector) -> SanarResult<String> {
        self.record(format!("read_text:{}", selector.as_str()));
        self.texts
            .lock()
            .unwrap()
            .get(selector.as_str())
            .cloned()
            .ok_or_else(|| SanarError::probe(format!("no text scripted for '{selector}'")))
    }

    async fn read_options(&self, selector: &Selector) -> SanarResult<Vec<String>> {
        self.record(format!("read_options:{}", selector.as_str()));
        self.options
            .lock()
            .unwrap()
            .get(selector.as_str())
            .cloned()
            .ok_or_else(|| SanarError::probe(format!("no options scripted for '{selector}'")))
    }

    async fn click(&self, selector: &Selector) -> SanarResult<()> {
        self.record(format!("click:{}", selector.as_str()));
        if self.match_count(selector) == 0 {
            return Err(SanarError::probe(format!("nothing to click for '{selector}'")));
        }
        Ok(())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> SanarResult<()> {
        self.record(format!("fill:{}:{text}", selector.as_str()));
        if self.match_count(selector) == 0 {
            return Err(SanarError::probe(format!("nothing to fill for '{selector}'")));
        }
        Ok(())
    }

    async fn capture_markup(&self) -> SanarResult<String> {
        self.record("capture_markup".to_string());
        Ok(self.markup.lock().unwrap().clone())
    }
}
