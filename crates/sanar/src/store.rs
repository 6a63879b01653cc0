//! CSV-backed locator storage.
//!
//! One table per logical page, one file per table. The file format is a
//! two-column CSV with the header row `Element Name,Locator`; a field is
//! quoted when it contains a comma, a quote, or leading/trailing whitespace,
//! and embedded quotes are doubled.
//!
//! A [`LocatorStore`] is exclusively owned by the resolver that loaded it and
//! is persisted back to its backing file on every successful repair
//! (write-through, no batching). It is never process-global; sharing one
//! across tests means passing it explicitly. Parallel test workers writing
//! the same backing file are last-writer-wins; callers must serialize
//! access to a shared locator file.

use crate::locator::LocatorEntry;
use crate::result::{SanarError, SanarResult};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header row of a locator file
pub const HEADER: &str = "Element Name,Locator";

/// Ordered table of element name → selector, optionally backed by a CSV file.
#[derive(Debug, Clone, Default)]
pub struct LocatorStore {
    path: Option<PathBuf>,
    entries: Vec<LocatorEntry>,
    index: HashMap<String, usize>,
}

impl LocatorStore {
    /// Create an empty, unbacked store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from its backing CSV file.
    pub fn load(path: impl Into<PathBuf>) -> SanarResult<Self> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        let mut store = Self::parse(&text)?;
        debug!(file = %path.display(), entries = store.len(), "locator table loaded");
        store.path = Some(path);
        Ok(store)
    }

    /// Parse a store from CSV text. The result is unbacked: [`Self::persist`]
    /// fails until a path is attached with [`Self::with_path`].
    pub fn parse(text: &str) -> SanarResult<Self> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| SanarError::store("empty locator file"))?;
        let header_fields = split_record(header)?;
        if header_fields.len() != 2
            || !header_fields[0].trim().eq_ignore_ascii_case("element name")
            || !header_fields[1].trim().eq_ignore_ascii_case("locator")
        {
            return Err(SanarError::store(format!(
                "expected header '{HEADER}', found '{header}'"
            )));
        }

        let mut store = Self::new();
        for (lineno, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = lineno + 2;
            let fields = split_record(line)?;
            if fields.len() != 2 {
                return Err(SanarError::store(format!(
                    "line {row}: expected 2 fields, found {}",
                    fields.len()
                )));
            }
            let (name, selector) = (&fields[0], &fields[1]);
            if name.trim().is_empty() {
                return Err(SanarError::store(format!("line {row}: empty element name")));
            }
            if store.index.contains_key(name) {
                return Err(SanarError::store(format!(
                    "line {row}: duplicate element name '{name}'"
                )));
            }
            store.index.insert(name.clone(), store.entries.len());
            store
                .entries
                .push(LocatorEntry::new(name.as_str(), selector.as_str()));
        }
        Ok(store)
    }

    /// Attach a backing file path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Backing file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether this store has a backing file.
    #[must_use]
    pub const fn is_backed(&self) -> bool {
        self.path.is_some()
    }

    /// Look up a selector by element name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].selector.as_str())
    }

    /// Whether an element name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Append a new entry. Fails on duplicate names (uniqueness invariant)
    /// and on names or selectors containing line breaks, which the row-based
    /// format cannot represent.
    pub fn push(&mut self, name: &str, selector: &str) -> SanarResult<()> {
        if name.trim().is_empty() {
            return Err(SanarError::store("empty element name"));
        }
        if self.index.contains_key(name) {
            return Err(SanarError::store(format!("duplicate element name '{name}'")));
        }
        validate_field(name)?;
        validate_field(selector)?;
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(LocatorEntry::new(name, selector));
        Ok(())
    }

    /// Replace the selector of an existing entry, preserving table order.
    pub fn update(&mut self, name: &str, selector: &str) -> SanarResult<()> {
        validate_field(selector)?;
        let &i = self
            .index
            .get(name)
            .ok_or_else(|| SanarError::UnknownElement {
                name: name.to_string(),
            })?;
        self.entries[i].selector = selector.to_string();
        Ok(())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &LocatorEntry> {
        self.entries.iter()
    }

    /// Element names in table order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Render the table as CSV text.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');
        for entry in &self.entries {
            let _ = writeln!(out, "{},{}", quote(&entry.name), quote(&entry.selector));
        }
        out
    }

    /// Write the whole table back to its backing file.
    ///
    /// # Errors
    ///
    /// Fails if the store has no backing file or the write fails.
    pub fn persist(&self) -> SanarResult<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| SanarError::store("store has no backing file"))?;
        std::fs::write(path, self.to_csv())?;
        info!(file = %path.display(), entries = self.len(), "locator table persisted");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a LocatorStore {
    type Item = &'a LocatorEntry;
    type IntoIter = std::slice::Iter<'a, LocatorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn validate_field(value: &str) -> SanarResult<()> {
    if value.contains('\n') || value.contains('\r') {
        return Err(SanarError::store("field contains a line break"));
    }
    Ok(())
}

/// Quote a field for CSV output when it needs it.
fn quote(field: &str) -> String {
    let needs_quotes = field.contains(',')
        || field.contains('"')
        || field.starts_with(' ')
        || field.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV record into fields, honoring quotes and doubled quotes.
fn split_record(line: &str) -> SanarResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut field));
                }
                _ => field.push(c),
            }
        }
    }
    if in_quotes {
        return Err(SanarError::store("unterminated quote"));
    }
    fields.push(field);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LocatorStore {
        let mut store = LocatorStore::new();
        store.push("btnLogin", "#old-login-btn").unwrap();
        store.push("txtUser", "input[name=user]").unwrap();
        store
            .push("lnkHelp", "//a[contains(text(), 'Help, please')]")
            .unwrap();
        store
    }

    mod codec_tests {
        use super::*;

        #[test]
        fn test_header_written() {
            let csv = sample().to_csv();
            assert!(csv.starts_with("Element Name,Locator\n"));
        }

        #[test]
        fn test_plain_fields_unquoted() {
            let csv = sample().to_csv();
            assert!(csv.contains("btnLogin,#old-login-btn\n"));
            assert!(csv.contains("txtUser,input[name=user]\n"));
        }

        #[test]
        fn test_comma_selector_quoted() {
            let csv = sample().to_csv();
            assert!(csv.contains("lnkHelp,\"//a[contains(text(), 'Help, please')]\"\n"));
        }

        #[test]
        fn test_embedded_quotes_doubled() {
            let mut store = LocatorStore::new();
            store.push("btnSave", "button[title=\"Save, all\"]").unwrap();
            let csv = store.to_csv();
            assert!(csv.contains("\"button[title=\"\"Save, all\"\"]\""));
            let reparsed = LocatorStore::parse(&csv).unwrap();
            assert_eq!(reparsed.get("btnSave"), Some("button[title=\"Save, all\"]"));
        }

        #[test]
        fn test_round_trip_exact() {
            let csv = sample().to_csv();
            let reparsed = LocatorStore::parse(&csv).unwrap();
            assert_eq!(reparsed.to_csv(), csv);
            for entry in sample().iter() {
                assert_eq!(reparsed.get(&entry.name), Some(entry.selector.as_str()));
            }
        }

        #[test]
        fn test_blank_lines_skipped() {
            let store =
                LocatorStore::parse("Element Name,Locator\n\nbtnLogin,#login\n\n").unwrap();
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn test_missing_header_rejected() {
            let err = LocatorStore::parse("btnLogin,#login\n").unwrap_err();
            assert!(matches!(err, SanarError::Store { .. }));
        }

        #[test]
        fn test_three_fields_rejected() {
            let err = LocatorStore::parse("Element Name,Locator\na,b,c\n").unwrap_err();
            assert!(matches!(err, SanarError::Store { .. }));
        }

        #[test]
        fn test_duplicate_row_rejected() {
            let err = LocatorStore::parse("Element Name,Locator\na,#x\na,#y\n").unwrap_err();
            assert!(matches!(err, SanarError::Store { message } if message.contains("duplicate")));
        }

        #[test]
        fn test_unterminated_quote_rejected() {
            let err = LocatorStore::parse("Element Name,Locator\na,\"b\n").unwrap_err();
            assert!(matches!(err, SanarError::Store { .. }));
        }

        #[test]
        fn test_empty_file_rejected() {
            assert!(LocatorStore::parse("").is_err());
        }
    }

    mod table_tests {
        use super::*;

        #[test]
        fn test_lookup() {
            let store = sample();
            assert_eq!(store.get("btnLogin"), Some("#old-login-btn"));
            assert_eq!(store.get("missing"), None);
        }

        #[test]
        fn test_duplicate_name_rejected() {
            let mut store = sample();
            let err = store.push("btnLogin", "#other").unwrap_err();
            assert!(matches!(err, SanarError::Store { .. }));
        }

        #[test]
        fn test_update_preserves_order() {
            let mut store = sample();
            store.update("btnLogin", "#login-submit").unwrap();
            assert_eq!(store.names(), vec!["btnLogin", "txtUser", "lnkHelp"]);
            assert_eq!(store.get("btnLogin"), Some("#login-submit"));
        }

        #[test]
        fn test_update_unknown_name() {
            let mut store = sample();
            let err = store.update("nope", "#x").unwrap_err();
            assert!(matches!(err, SanarError::UnknownElement { .. }));
        }

        #[test]
        fn test_line_break_rejected() {
            let mut store = LocatorStore::new();
            assert!(store.push("bad", "a\nb").is_err());
        }

        #[test]
        fn test_persist_requires_backing_file() {
            let store = sample();
            assert!(!store.is_backed());
            assert!(store.persist().is_err());
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_load_persist_reload() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("Login_Elements.csv");
            std::fs::write(&path, sample().to_csv()).unwrap();

            let mut store = LocatorStore::load(&path).unwrap();
            store.update("btnLogin", "#login-submit").unwrap();
            store.persist().unwrap();

            let reloaded = LocatorStore::load(&path).unwrap();
            assert_eq!(reloaded.get("btnLogin"), Some("#login-submit"));
            assert_eq!(reloaded.len(), 3);
            assert_eq!(reloaded.to_csv(), store.to_csv());
        }
    }

    mod codec_property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_any_selector(selector in "[^\r\n]{0,64}") {
                let mut store = LocatorStore::new();
                store.push("el", &selector).unwrap();
                let reparsed = LocatorStore::parse(&store.to_csv()).unwrap();
                prop_assert_eq!(reparsed.get("el"), Some(selector.as_str()));
            }
        }
    }
}
