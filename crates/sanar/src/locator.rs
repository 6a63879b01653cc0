//! Selector model for element location.
//!
//! Locator tables store selectors as opaque strings; this module classifies a
//! raw string as CSS or XPath and renders the JavaScript query expressions a
//! browser probe evaluates against live page state.

use serde::{Deserialize, Serialize};

/// A selector for locating elements: CSS or XPath.
///
/// Classification is by shape only: strings starting with `/`, `(`, or an
/// explicit `xpath=` prefix are XPath, everything else is CSS. The resolver
/// never inspects selector structure beyond this split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector (e.g., "//button[@id='login']")
    XPath(String),
}

impl Selector {
    /// Classify a raw selector string as CSS or XPath.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("xpath=") {
            Self::XPath(rest.to_string())
        } else if trimmed.starts_with('/') || trimmed.starts_with('(') {
            Self::XPath(trimmed.to_string())
        } else {
            Self::Css(trimmed.to_string())
        }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// The raw selector string
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// Whether this is an XPath selector
    #[must_use]
    pub const fn is_xpath(&self) -> bool {
        matches!(self, Self::XPath(_))
    }

    /// JavaScript expression collecting all matching elements as an array.
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({s:?}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()"
            ),
        }
    }

    /// JavaScript expression selecting the first matching element (or null).
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, \
                 XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
        }
    }

    /// JavaScript expression counting all matches.
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_all_query())
    }

    /// JavaScript expression counting *visible* matches.
    ///
    /// Visibility is the probe-side half of "exactly one visible, actionable
    /// element": an element with zero layout boxes is not actionable.
    #[must_use]
    pub fn to_visible_count_query(&self) -> String {
        format!(
            "{}.filter(el => !!(el.offsetWidth || el.offsetHeight || \
             el.getClientRects().length)).length",
            self.to_all_query()
        )
    }

    /// JavaScript expression reading the first match's text content.
    #[must_use]
    pub fn to_text_query(&self) -> String {
        format!(
            "(() => {{ const el = {}; return el ? el.textContent : null; }})()",
            self.to_query()
        )
    }

    /// JavaScript expression reading option labels of a `<select>` (or the
    /// text of list children), in document order.
    #[must_use]
    pub fn to_options_query(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return null; \
             const opts = el.options ? Array.from(el.options) : Array.from(el.children); \
             return opts.map(o => o.textContent.trim()); }})()",
            self.to_query()
        )
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// One row of a locator table: logical name → selector string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorEntry {
    /// Logical element name, unique within its table
    pub name: String,
    /// Opaque selector string (CSS or XPath)
    pub selector: String,
}

impl LocatorEntry {
    /// Create a new entry
    #[must_use]
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }

    /// Classify this entry's selector
    #[must_use]
    pub fn selector(&self) -> Selector {
        Selector::parse(&self.selector)
    }
}
