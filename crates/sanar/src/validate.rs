//! Validation helpers: resolve a locator, read an observable page property,
//! compare against an expected value.
//!
//! Each helper fails with [`SanarError::Assertion`] carrying both expected
//! and actual values, and returns the [`Resolution`] so callers can observe
//! healing.

use crate::locator::Selector;
use crate::probe::PageProbe;
use crate::resolver::{Resolution, Resolver};
use crate::result::{SanarError, SanarResult};

/// Assert the exact text content of an element.
pub async fn validate_text(
    resolver: &mut Resolver,
    probe: &dyn PageProbe,
    name: &str,
    expected: &str,
) -> SanarResult<Resolution> {
    let resolution = resolver.resolve(probe, name).await?;
    let actual = probe
        .read_text(&Selector::parse(&resolution.selector))
        .await?;
    if actual != expected {
        return Err(SanarError::Assertion {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(resolution)
}

/// Assert the text of a popup/dialog element, ignoring surrounding
/// whitespace (popup markup routinely pads its message).
pub async fn validate_popup(
    resolver: &mut Resolver,
    probe: &dyn PageProbe,
    name: &str,
    expected: &str,
) -> SanarResult<Resolution> {
    let resolution = resolver.resolve(probe, name).await?;
    let actual = probe
        .read_text(&Selector::parse(&resolution.selector))
        .await?;
    if actual.trim() != expected.trim() {
        return Err(SanarError::Assertion {
            expected: expected.trim().to_string(),
            actual: actual.trim().to_string(),
        });
    }
    Ok(resolution)
}

/// Assert the ordered option labels of a list element.
pub async fn validate_list_options(
    resolver: &mut Resolver,
    probe: &dyn PageProbe,
    name: &str,
    expected: &[&str],
) -> SanarResult<Resolution> {
    let resolution = resolver.resolve(probe, name).await?;
    let actual = probe
        .read_options(&Selector::parse(&resolution.selector))
        .await?;
    if actual != expected {
        return Err(SanarError::Assertion {
            expected: expected.join(", "),
            actual: actual.join(", "),
        });
    }
    Ok(resolution)
}

/// Assert the text of several (element name, expected) pairs; the first
/// mismatch fails. Returns one resolution per field, in input order.
pub async fn validate_fields(
    resolver: &mut Resolver,
    probe: &dyn PageProbe,
    fields: &[(&str, &str)],
) -> SanarResult<Vec<Resolution>> {
    let mut resolutions = Vec::with_capacity(fields.len());
    for (name, expected) in fields {
        resolutions.push(validate_text(resolver, probe, name, expected).await?);
    }
    Ok(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::MockProbe;
    use crate::store::LocatorStore;
    use crate::suggest::StaticSuggester;
    use std::sync::Arc;

    fn store() -> LocatorStore {
        let mut store = LocatorStore::new();
        store.push("lblWelcome", "#welcome").unwrap();
        store.push("selCountry", "select#country").unwrap();
        store.push("lblProject", "#project").unwrap();
        store
    }

    #[tokio::test]
    async fn test_validate_text_pass() {
        let probe = MockProbe::new();
        probe.set_matches("#welcome", 1);
        probe.set_text("#welcome", "Welcome back");
        let mut resolver = Resolver::new(store());

        let res = validate_text(&mut resolver, &probe, "lblWelcome", "Welcome back")
            .await
            .unwrap();
        assert!(!res.healed);
    }

    #[tokio::test]
    async fn test_validate_text_mismatch_carries_both_values() {
        let probe = MockProbe::new();
        probe.set_matches("#welcome", 1);
        probe.set_text("#welcome", "Hello");
        let mut resolver = Resolver::new(store());

        let err = validate_text(&mut resolver, &probe, "lblWelcome", "Welcome back")
            .await
            .unwrap_err();
        match err {
            SanarError::Assertion { expected, actual } => {
                assert_eq!(expected, "Welcome back");
                assert_eq!(actual, "Hello");
            }
            other => panic!("expected Assertion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validate_popup_trims() {
        let probe = MockProbe::new();
        probe.set_matches("#welcome", 1);
        probe.set_text("#welcome", "\n  Session expired  \n");
        let mut resolver = Resolver::new(store());

        validate_popup(&mut resolver, &probe, "lblWelcome", "Session expired")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validate_list_options_ordered() {
        let probe = MockProbe::new();
        probe.set_matches("select#country", 1);
        probe.set_options(
            "select#country",
            vec!["Chile".to_string(), "Peru".to_string()],
        );
        let mut resolver = Resolver::new(store());

        validate_list_options(&mut resolver, &probe, "selCountry", &["Chile", "Peru"])
            .await
            .unwrap();

        let err = validate_list_options(&mut resolver, &probe, "selCountry", &["Peru", "Chile"])
            .await
            .unwrap_err();
        assert!(matches!(err, SanarError::Assertion { .. }));
    }

    #[tokio::test]
    async fn test_validate_fields_stops_at_first_mismatch() {
        let probe = MockProbe::new();
        probe.set_matches("#welcome", 1);
        probe.set_matches("#project", 1);
        probe.set_text("#welcome", "Welcome back");
        probe.set_text("#project", "Atlas");
        let mut resolver = Resolver::new(store());

        let resolutions = validate_fields(
            &mut resolver,
            &probe,
            &[("lblWelcome", "Welcome back"), ("lblProject", "Atlas")],
        )
        .await
        .unwrap();
        assert_eq!(resolutions.len(), 2);

        let err = validate_fields(
            &mut resolver,
            &probe,
            &[("lblWelcome", "Wrong"), ("lblProject", "Atlas")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SanarError::Assertion { .. }));
    }

    #[tokio::test]
    async fn test_validation_observes_healing() {
        let probe = MockProbe::new();
        probe.set_matches("#greeting", 1);
        probe.set_text("#greeting", "Welcome back");
        let mut resolver =
            Resolver::new(store()).with_suggester(Arc::new(StaticSuggester::suggesting("#greeting")));

        let res = validate_text(&mut resolver, &probe, "lblWelcome", "Welcome back")
            .await
            .unwrap();
        assert!(res.healed);
        assert_eq!(resolver.store().get("lblWelcome"), Some("#greeting"));
    }
}
