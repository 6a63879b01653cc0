//! Fixture management for test sessions.
//!
//! Session state (settings, the probe handle, the page set) is composed
//! from fixtures with priority-ordered setup and reverse-order teardown.
//! If any fixture fails to set up, the ones already set up are torn down
//! before the error is returned.

use crate::result::{SanarError, SanarResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Trait for test fixtures that can be set up and torn down.
///
/// # Example
///
/// ```ignore
/// struct BrowserFixture {
///     probe: Option<CdpProbe>,
/// }
///
/// impl Fixture for BrowserFixture {
///     fn setup(&mut self) -> SanarResult<()> {
///         self.probe = Some(launch()?);
///         Ok(())
///     }
///
///     fn teardown(&mut self) -> SanarResult<()> {
///         self.probe.take();
///         Ok(())
///     }
/// }
/// ```
pub trait Fixture: Any + Send + Sync {
    /// Set up the fixture before test execution.
    fn setup(&mut self) -> SanarResult<()>;

    /// Tear down the fixture after test execution.
    fn teardown(&mut self) -> SanarResult<()>;

    /// Fixture name for logging/debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Fixture priority (higher = set up first, tear down last).
    fn priority(&self) -> i32 {
        0
    }
}

/// State of a fixture in the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered but not set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup failed
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
    priority: i32,
}

/// Manager for test fixtures with priority-ordered setup/teardown.
#[derive(Default)]
pub struct FixtureManager {
    fixtures: HashMap<TypeId, FixtureEntry>,
    setup_order: Vec<TypeId>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixture_count", &self.fixtures.len())
            .field("setup_order", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create a new fixture manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture. A fixture of the same type replaces the previous
    /// registration.
    pub fn register<F: Fixture + 'static>(&mut self, fixture: F) {
        let type_id = TypeId::of::<F>();
        let priority = fixture.priority();
        let _ = self.fixtures.insert(
            type_id,
            FixtureEntry {
                fixture: Box::new(fixture),
                state: FixtureState::Registered,
                priority,
            },
        );
    }

    /// Whether a fixture type is registered.
    #[must_use]
    pub fn is_registered<F: Fixture + 'static>(&self) -> bool {
        self.fixtures.contains_key(&TypeId::of::<F>())
    }

    /// Number of registered fixtures.
    #[must_use]
    pub fn count(&self) -> usize {
        self.fixtures.len()
    }

    /// State of a fixture.
    #[must_use]
    pub fn state<F: Fixture + 'static>(&self) -> Option<FixtureState> {
        self.fixtures.get(&TypeId::of::<F>()).map(|e| e.state)
    }

    /// Reference to a fixture by type.
    #[must_use]
    pub fn get<F: Fixture + 'static>(&self) -> Option<&F> {
        self.fixtures
            .get(&TypeId::of::<F>())
            .and_then(|entry| entry.fixture.as_ref().as_any().downcast_ref::<F>())
    }

    /// Mutable reference to a fixture by type.
    #[must_use]
    pub fn get_mut<F: Fixture + 'static>(&mut self) -> Option<&mut F> {
        self.fixtures
            .get_mut(&TypeId::of::<F>())
            .and_then(|entry| entry.fixture.as_mut().as_any_mut().downcast_mut::<F>())
    }

    /// Set up all registered fixtures in priority order (highest first).
    ///
    /// # Errors
    ///
    /// Returns an error if any fixture setup fails. Previously set up
    /// fixtures are torn down before returning the error.
    pub fn setup_all(&mut self) -> SanarResult<()> {
        let mut ordered: Vec<(TypeId, i32)> = self
            .fixtures
            .iter()
            .map(|(id, e)| (*id, e.priority))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        self.setup_order.clear();
        let mut failure: Option<String> = None;

        for (type_id, _) in ordered {
            if let Some(entry) = self.fixtures.get_mut(&type_id) {
                if entry.state == FixtureState::Registered || entry.state == FixtureState::TornDown
                {
                    if let Err(e) = entry.fixture.setup() {
                        let name = entry.fixture.name().to_string();
                        entry.state = FixtureState::Failed;
                        failure = Some(format!("fixture '{name}' setup failed: {e}"));
                        break;
                    }
                    entry.state = FixtureState::SetUp;
                    self.setup_order.push(type_id);
                }
            }
        }

        if let Some(message) = failure {
            self.teardown_setup_order()?;
            return Err(SanarError::Fixture { message });
        }
        Ok(())
    }

    /// Tear down all fixtures in reverse setup order.
    ///
    /// # Errors
    ///
    /// Returns the first teardown error; remaining fixtures are still torn
    /// down.
    pub fn teardown_all(&mut self) -> SanarResult<()> {
        self.teardown_setup_order()
    }

    fn teardown_setup_order(&mut self) -> SanarResult<()> {
        let mut first_error: Option<SanarError> = None;

        for type_id in self.setup_order.iter().rev() {
            if let Some(entry) = self.fixtures.get_mut(type_id) {
                if entry.state == FixtureState::SetUp {
                    if let Err(e) = entry.fixture.teardown() {
                        if first_error.is_none() {
                            first_error = Some(SanarError::Fixture {
                                message: format!(
                                    "fixture '{}' teardown failed: {e}",
                                    entry.fixture.name()
                                ),
                            });
                        }
                        entry.state = FixtureState::Failed;
                    } else {
                        entry.state = FixtureState::TornDown;
                    }
                }
            }
        }

        self.setup_order.clear();
        first_error.map_or(Ok(()), Err)
    }
}

impl dyn Fixture {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct OrderedFixture {
        priority: i32,
        fail_setup: bool,
        log: Arc<std::sync::Mutex<Vec<String>>>,
        label: &'static str,
    }

    impl Fixture for OrderedFixture {
        fn setup(&mut self) -> SanarResult<()> {
            if self.fail_setup {
                return Err(SanarError::config("deliberate"));
            }
            self.log.lock().unwrap().push(format!("setup:{}", self.label));
            Ok(())
        }

        fn teardown(&mut self) -> SanarResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("teardown:{}", self.label));
            Ok(())
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[derive(Debug, Default)]
    struct CounterFixture {
        setups: AtomicUsize,
    }

    impl Fixture for CounterFixture {
        fn setup(&mut self) -> SanarResult<()> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn teardown(&mut self) -> SanarResult<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingFixture;

    impl Fixture for FailingFixture {
        fn setup(&mut self) -> SanarResult<()> {
            Err(SanarError::config("no browser available"))
        }

        fn teardown(&mut self) -> SanarResult<()> {
            Ok(())
        }

        fn priority(&self) -> i32 {
            -10
        }
    }

    #[test]
    fn test_setup_priority_and_teardown_reverse() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut manager = FixtureManager::new();
        manager.register(OrderedFixture {
            priority: 10,
            fail_setup: false,
            log: log.clone(),
            label: "config",
        });

        manager.setup_all().unwrap();
        manager.teardown_all().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["setup:config".to_string(), "teardown:config".to_string()]
        );
    }

    #[test]
    fn test_failed_setup_rolls_back() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut manager = FixtureManager::new();
        manager.register(OrderedFixture {
            priority: 10,
            fail_setup: false,
            log: log.clone(),
            label: "config",
        });
        manager.register(FailingFixture);

        let err = manager.setup_all().unwrap_err();
        assert!(matches!(err, SanarError::Fixture { .. }));
        // The higher-priority fixture was set up first and rolled back.
        assert_eq!(
            *log.lock().unwrap(),
            vec!["setup:config".to_string(), "teardown:config".to_string()]
        );
    }

    #[test]
    fn test_typed_access() {
        let mut manager = FixtureManager::new();
        manager.register(CounterFixture::default());
        manager.setup_all().unwrap();

        let fixture = manager.get::<CounterFixture>().unwrap();
        assert_eq!(fixture.setups.load(Ordering::SeqCst), 1);
        assert!(manager.get_mut::<CounterFixture>().is_some());
        assert_eq!(manager.state::<CounterFixture>(), Some(FixtureState::SetUp));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut manager = FixtureManager::new();
        manager.register(CounterFixture::default());
        manager.register(CounterFixture::default());
        assert_eq!(manager.count(), 1);
    }
}
