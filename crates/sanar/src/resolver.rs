//! Self-healing locator resolution.
//!
//! Given a logical element name and a CSV-backed locator table, return a
//! selector usable on the current page. If the stored selector fails
//! verification, make exactly one suggestion-service call, re-verify the
//! candidate, and persist the correction write-through. The table only ever
//! moves from a selector that failed verification to one that passed it, so
//! it never degrades from known-good to unverified.
//!
//! There is intentionally no caching of failed suggestions and no retry loop
//! beyond the single repair attempt: consecutive failures surface to the
//! caller instead of looping.

use crate::locator::Selector;
use crate::probe::PageProbe;
use crate::result::{SanarError, SanarResult};
use crate::store::LocatorStore;
use crate::suggest::SuggestionService;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a resolution: the usable selector and whether it was repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Selector that verified against the current page
    pub selector: String,
    /// Whether the selector was healed during this resolution
    pub healed: bool,
}

/// Self-healing resolver owning one locator table.
///
/// Each resolver exclusively owns its [`LocatorStore`]; there is no
/// cross-test sharing. The suggestion service is optional; without one the
/// resolver still verifies stored selectors but cannot repair them.
pub struct Resolver {
    store: LocatorStore,
    suggester: Option<Arc<dyn SuggestionService>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("store", &self.store)
            .field("has_suggester", &self.suggester.is_some())
            .finish()
    }
}

impl Resolver {
    /// Create a resolver over a locator table.
    #[must_use]
    pub fn new(store: LocatorStore) -> Self {
        Self {
            store,
            suggester: None,
        }
    }

    /// Attach a suggestion service.
    #[must_use]
    pub fn with_suggester(mut self, suggester: Arc<dyn SuggestionService>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    /// The owned locator table.
    #[must_use]
    pub fn store(&self) -> &LocatorStore {
        &self.store
    }

    /// Verify the stored selector for an element without attempting repair.
    ///
    /// # Errors
    ///
    /// - [`SanarError::UnknownElement`] if the name is absent from the table.
    /// - [`SanarError::Verification`] if the stored selector does not match
    ///   exactly one visible element.
    pub async fn verify_stored(&self, probe: &dyn PageProbe, name: &str) -> SanarResult<()> {
        let stored = self
            .store
            .get(name)
            .ok_or_else(|| SanarError::UnknownElement {
                name: name.to_string(),
            })?;
        if probe.verify(&Selector::parse(stored)).await? {
            Ok(())
        } else {
            Err(SanarError::Verification {
                selector: stored.to_string(),
            })
        }
    }

    /// Resolve an element name to a selector usable on the current page.
    ///
    /// # Errors
    ///
    /// - [`SanarError::UnknownElement`] if the name is absent from the table
    ///   (caller bug: never auto-repaired, never defaulted).
    /// - [`SanarError::Unresolvable`] if the stored selector fails
    ///   verification and the single repair attempt also fails. The table is
    ///   not mutated on any failure path.
    pub async fn resolve(
        &mut self,
        probe: &dyn PageProbe,
        name: &str,
    ) -> SanarResult<Resolution> {
        let stored = self
            .store
            .get(name)
            .ok_or_else(|| SanarError::UnknownElement {
                name: name.to_string(),
            })?
            .to_string();

        let selector = Selector::parse(&stored);
        if probe.verify(&selector).await? {
            debug!(element = name, selector = %stored, "stored locator verified");
            return Ok(Resolution {
                selector: stored,
                healed: false,
            });
        }

        warn!(element = name, selector = %stored, "stored locator failed verification");
        self.heal(probe, name, &stored).await
    }

    /// Single repair attempt: one suggestion call, one re-verification,
    /// write-through persistence only after the candidate verifies.
    async fn heal(
        &mut self,
        probe: &dyn PageProbe,
        name: &str,
        stored: &str,
    ) -> SanarResult<Resolution> {
        let Some(suggester) = self.suggester.clone() else {
            return Err(SanarError::unresolvable(
                name,
                format!("'{stored}' failed verification and no suggestion service is configured"),
            ));
        };

        let markup = probe.capture_markup().await?;
        let candidate = match suggester.suggest(&markup, name, stored).await {
            Ok(Some(c)) if !c.trim().is_empty() => c.trim().to_string(),
            Ok(_) => {
                return Err(SanarError::unresolvable(
                    name,
                    "suggestion service returned no usable candidate",
                ));
            }
            Err(SanarError::ServiceUnavailable { message }) => {
                // Distinct diagnostics; the caller just sees a failed repair.
                warn!(element = name, %message, "suggestion service unavailable");
                return Err(SanarError::unresolvable(
                    name,
                    format!("suggestion service unavailable: {message}"),
                ));
            }
            Err(e) => return Err(e),
        };

        info!(element = name, candidate = %candidate, "re-verifying suggested locator");
        if !probe.verify(&Selector::parse(&candidate)).await? {
            return Err(SanarError::unresolvable(
                name,
                format!("suggested locator '{candidate}' failed verification"),
            ));
        }

        if let Some(other) = self
            .store
            .iter()
            .find(|e| e.name != name && e.selector == candidate)
        {
            warn!(
                element = name,
                collides_with = %other.name,
                selector = %candidate,
                "healed locator is identical to another entry's"
            );
        }

        self.store.update(name, &candidate)?;
        if self.store.is_backed() {
            self.store.persist()?;
        }
        info!(element = name, old = %stored, new = %candidate, "locator healed");

        Ok(Resolution {
            selector: candidate,
            healed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::MockProbe;
    use crate::suggest::StaticSuggester;

    fn login_store() -> LocatorStore {
        let mut store = LocatorStore::new();
        store.push("btnLogin", "#old-login-btn").unwrap();
        store.push("txtUser", "input[name=user]").unwrap();
        store
    }

    mod verified_path_tests {
        use super::*;

        #[tokio::test]
        async fn test_verified_selector_returned_unchanged() {
            let probe = MockProbe::new();
            probe.set_matches("input[name=user]", 1);
            let mut resolver = Resolver::new(login_store());

            let got = resolver.resolve(&probe, "txtUser").await.unwrap();
            assert_eq!(got.selector, "input[name=user]");
            assert!(!got.healed);
            assert_eq!(resolver.store().get("txtUser"), Some("input[name=user]"));
            assert!(!probe.was_called("capture_markup"));
        }

        #[tokio::test]
        async fn test_verify_stored_reports_without_repair() {
            let probe = MockProbe::new();
            probe.set_matches("input[name=user]", 1);
            let resolver = Resolver::new(login_store())
                .with_suggester(Arc::new(StaticSuggester::suggesting("#never-used")));

            resolver.verify_stored(&probe, "txtUser").await.unwrap();

            let err = resolver.verify_stored(&probe, "btnLogin").await.unwrap_err();
            assert!(
                matches!(err, SanarError::Verification { selector } if selector == "#old-login-btn")
            );
            // No repair path: the suggester is never consulted.
            assert!(!probe.was_called("capture_markup"));
        }

        #[tokio::test]
        async fn test_unknown_name_is_lookup_error() {
            let probe = MockProbe::new();
            let mut resolver = Resolver::new(login_store());

            let err = resolver.resolve(&probe, "btnMissing").await.unwrap_err();
            assert!(matches!(err, SanarError::UnknownElement { name } if name == "btnMissing"));
            // No probe traffic for a caller bug.
            assert!(probe.history().is_empty());
        }
    }

    mod healing_tests {
        use super::*;

        #[tokio::test]
        async fn test_heal_success() {
            let probe = MockProbe::new().with_markup("<form><button id='login-submit'/></form>");
            probe.set_matches("#login-submit", 1);
            let suggester = Arc::new(StaticSuggester::suggesting("#login-submit"));
            let mut resolver =
                Resolver::new(login_store()).with_suggester(suggester.clone());

            let got = resolver.resolve(&probe, "btnLogin").await.unwrap();
            assert_eq!(got.selector, "#login-submit");
            assert!(got.healed);
            assert_eq!(resolver.store().get("btnLogin"), Some("#login-submit"));

            // The suggester saw the markup context exactly once.
            assert_eq!(
                suggester.calls(),
                vec![("btnLogin".to_string(), "#old-login-btn".to_string())]
            );
        }

        #[tokio::test]
        async fn test_heal_is_idempotent() {
            let probe = MockProbe::new();
            probe.set_matches("#login-submit", 1);
            let mut resolver = Resolver::new(login_store())
                .with_suggester(Arc::new(StaticSuggester::suggesting("#login-submit")));

            let first = resolver.resolve(&probe, "btnLogin").await.unwrap();
            assert!(first.healed);

            let second = resolver.resolve(&probe, "btnLogin").await.unwrap();
            assert_eq!(second.selector, "#login-submit");
            assert!(!second.healed);
        }

        #[tokio::test]
        async fn test_unverified_candidate_not_persisted() {
            let probe = MockProbe::new();
            let suggester = Arc::new(StaticSuggester::suggesting("#hallucinated"));
            let mut resolver = Resolver::new(login_store()).with_suggester(suggester);

            let err = resolver.resolve(&probe, "btnLogin").await.unwrap_err();
            assert!(matches!(err, SanarError::Unresolvable { .. }));
            assert_eq!(resolver.store().get("btnLogin"), Some("#old-login-btn"));
        }

        #[tokio::test]
        async fn test_empty_suggestion_fails_without_mutation() {
            let probe = MockProbe::new();
            let mut resolver =
                Resolver::new(login_store()).with_suggester(Arc::new(StaticSuggester::empty()));

            let err = resolver.resolve(&probe, "btnLogin").await.unwrap_err();
            assert!(matches!(err, SanarError::Unresolvable { .. }));
            assert_eq!(resolver.store().get("btnLogin"), Some("#old-login-btn"));
        }

        #[tokio::test]
        async fn test_no_suggester_fails_directly() {
            let probe = MockProbe::new();
            let mut resolver = Resolver::new(login_store());

            let err = resolver.resolve(&probe, "btnLogin").await.unwrap_err();
            assert!(matches!(err, SanarError::Unresolvable { .. }));
            assert!(!probe.was_called("capture_markup"));
        }

        #[tokio::test]
        async fn test_service_unavailable_surfaces_as_unresolvable() {
            struct DownService;

            #[async_trait::async_trait]
            impl SuggestionService for DownService {
                async fn suggest(
                    &self,
                    _markup: &str,
                    _element_name: &str,
                    _prior_selector: &str,
                ) -> SanarResult<Option<String>> {
                    Err(SanarError::ServiceUnavailable {
                        message: "connection refused".to_string(),
                    })
                }
            }

            let probe = MockProbe::new();
            let mut resolver = Resolver::new(login_store()).with_suggester(Arc::new(DownService));

            let err = resolver.resolve(&probe, "btnLogin").await.unwrap_err();
            match err {
                SanarError::Unresolvable { reason, .. } => {
                    assert!(reason.contains("connection refused"));
                }
                other => panic!("expected Unresolvable, got {other:?}"),
            }
            assert_eq!(resolver.store().get("btnLogin"), Some("#old-login-btn"));
        }
    }

    mod persistence_tests {
        use super::*;

        #[tokio::test]
        async fn test_heal_persists_write_through() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("Login_Elements.csv");
            std::fs::write(&path, login_store().to_csv()).unwrap();

            let probe = MockProbe::new();
            probe.set_matches("#login-submit", 1);
            let mut resolver = Resolver::new(LocatorStore::load(&path).unwrap())
                .with_suggester(Arc::new(StaticSuggester::suggesting("#login-submit")));

            let got = resolver.resolve(&probe, "btnLogin").await.unwrap();
            assert!(got.healed);

            let reloaded = LocatorStore::load(&path).unwrap();
            assert_eq!(reloaded.get("btnLogin"), Some("#login-submit"));
            // Untouched entries survive the rewrite.
            assert_eq!(reloaded.get("txtUser"), Some("input[name=user]"));
        }

        #[tokio::test]
        async fn test_failed_repair_leaves_file_byte_identical() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("Login_Elements.csv");
            std::fs::write(&path, login_store().to_csv()).unwrap();
            let before = std::fs::read(&path).unwrap();

            let probe = MockProbe::new();
            let mut resolver = Resolver::new(LocatorStore::load(&path).unwrap())
                .with_suggester(Arc::new(StaticSuggester::suggesting("#hallucinated")));

            resolver.resolve(&probe, "btnLogin").await.unwrap_err();
            assert_eq!(std::fs::read(&path).unwrap(), before);
        }
    }
}
