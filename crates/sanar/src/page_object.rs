//! Page objects and explicit dependency construction.
//!
//! A [`PageObject`] encapsulates one logical page: it owns the resolver for
//! that page's locator table and exposes name-based actions and validations.
//! A [`PageSet`] is built up front by [`PageSetBuilder`], a builder that
//! loads one locator file per registered page and hands back named handles.
//! There is no attribute magic and no process-global registry; tests receive
//! the set by value or reference.

use crate::locator::Selector;
use crate::probe::PageProbe;
use crate::resolver::{Resolution, Resolver};
use crate::result::{SanarError, SanarResult};
use crate::store::LocatorStore;
use crate::suggest::SuggestionService;
use crate::validate;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// One logical page: a named locator table plus the resolver that owns it.
#[derive(Debug)]
pub struct PageObject {
    name: String,
    resolver: Resolver,
}

impl PageObject {
    /// Create a page object over an already-loaded table.
    #[must_use]
    pub fn new(name: impl Into<String>, store: LocatorStore) -> Self {
        Self {
            name: name.into(),
            resolver: Resolver::new(store),
        }
    }

    /// Load a page object from a locator file.
    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> SanarResult<Self> {
        Ok(Self::new(name, LocatorStore::load(path)?))
    }

    /// Attach a suggestion service to this page's resolver.
    #[must_use]
    pub fn with_suggester(mut self, suggester: Arc<dyn SuggestionService>) -> Self {
        self.resolver = self.resolver.with_suggester(suggester);
        self
    }

    /// Page name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The page's resolver
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve an element of this page.
    pub async fn resolve(
        &mut self,
        probe: &dyn PageProbe,
        element: &str,
    ) -> SanarResult<Resolution> {
        self.resolver.resolve(probe, element).await
    }

    /// Resolve and click an element.
    pub async fn click(&mut self, probe: &dyn PageProbe, element: &str) -> SanarResult<Resolution> {
        let resolution = self.resolver.resolve(probe, element).await?;
        probe.click(&Selector::parse(&resolution.selector)).await?;
        Ok(resolution)
    }

    /// Resolve and fill an element.
    pub async fn fill(
        &mut self,
        probe: &dyn PageProbe,
        element: &str,
        text: &str,
    ) -> SanarResult<Resolution> {
        let resolution = self.resolver.resolve(probe, element).await?;
        probe
            .fill(&Selector::parse(&resolution.selector), text)
            .await?;
        Ok(resolution)
    }

    /// Resolve and read an element's text.
    pub async fn read_text(&mut self, probe: &dyn PageProbe, element: &str) -> SanarResult<String> {
        let resolution = self.resolver.resolve(probe, element).await?;
        probe.read_text(&Selector::parse(&resolution.selector)).await
    }

    /// Assert the exact text of an element.
    pub async fn validate_text(
        &mut self,
        probe: &dyn PageProbe,
        element: &str,
        expected: &str,
    ) -> SanarResult<Resolution> {
        validate::validate_text(&mut self.resolver, probe, element, expected).await
    }

    /// Assert the trimmed text of a popup element.
    pub async fn validate_popup(
        &mut self,
        probe: &dyn PageProbe,
        element: &str,
        expected: &str,
    ) -> SanarResult<Resolution> {
        validate::validate_popup(&mut self.resolver, probe, element, expected).await
    }

    /// Assert the ordered option labels of a list element.
    pub async fn validate_list_options(
        &mut self,
        probe: &dyn PageProbe,
        element: &str,
        expected: &[&str],
    ) -> SanarResult<Resolution> {
        validate::validate_list_options(&mut self.resolver, probe, element, expected).await
    }

    /// Assert the text of several (element, expected) pairs.
    pub async fn validate_fields(
        &mut self,
        probe: &dyn PageProbe,
        fields: &[(&str, &str)],
    ) -> SanarResult<Vec<Resolution>> {
        validate::validate_fields(&mut self.resolver, probe, fields).await
    }
}

/// Named page-object handles for one test session.
#[derive(Debug, Default)]
pub struct PageSet {
    pages: HashMap<String, PageObject>,
}

impl PageSet {
    /// Get a page by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PageObject> {
        self.pages.get(name)
    }

    /// Get a page by name, mutably.
    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PageObject> {
        self.pages.get_mut(name)
    }

    /// Get a page by name, failing with a configuration error if absent.
    pub fn require_mut(&mut self, name: &str) -> SanarResult<&mut PageObject> {
        self.pages
            .get_mut(name)
            .ok_or_else(|| SanarError::config(format!("no page registered as '{name}'")))
    }

    /// Registered page names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.pages.keys().map(String::as_str).collect()
    }

    /// Number of registered pages.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pages.len()
    }
}

/// Builder constructing a [`PageSet`] from locator files.
#[derive(Default)]
pub struct PageSetBuilder {
    root: Option<PathBuf>,
    pages: Vec<(String, PathBuf)>,
    suggester: Option<Arc<dyn SuggestionService>>,
}

impl std::fmt::Debug for PageSetBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSetBuilder")
            .field("root", &self.root)
            .field("pages", &self.pages)
            .field("has_suggester", &self.suggester.is_some())
            .finish()
    }
}

impl PageSetBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that relative locator-file paths are resolved against.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Suggestion service shared by every page in the set.
    #[must_use]
    pub fn with_suggester(mut self, suggester: Arc<dyn SuggestionService>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    /// Register a page backed by a locator file.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.pages.push((name.into(), file.into()));
        self
    }

    /// Load every registered locator file and build the set.
    ///
    /// # Errors
    ///
    /// Fails on duplicate page names and on any table that does not load.
    pub fn build(self) -> SanarResult<PageSet> {
        let mut set = PageSet::default();
        for (name, file) in self.pages {
            if set.pages.contains_key(&name) {
                return Err(SanarError::config(format!("duplicate page name '{name}'")));
            }
            let path = match &self.root {
                Some(root) if file.is_relative() => root.join(&file),
                _ => file,
            };
            let mut page = PageObject::from_file(&name, path)?;
            if let Some(ref suggester) = self.suggester {
                page = page.with_suggester(Arc::clone(suggester));
            }
            debug!(page = %name, entries = page.resolver().store().len(), "page registered");
            set.pages.insert(name, page);
        }
        Ok(set)
    }
}
