//! Ordered step plans.
//!
//! A [`StepPlan`] is an explicit ordered list of named steps with declared
//! 1-based order indices. Validation rejects duplicate and gapped indices
//! (the indices must be exactly `1..=n`), and execution runs strictly in
//! declared sequence, stopping at the first failure.

use crate::result::{SanarError, SanarResult};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{error, info};

type StepFuture = Pin<Box<dyn Future<Output = SanarResult<()>> + Send>>;
type StepFn = Box<dyn FnMut() -> StepFuture + Send>;

/// A single named step with its declared order index.
pub struct Step {
    /// 1-based order index
    pub order: u32,
    /// Step name
    pub name: String,
    action: StepFn,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("order", &self.order)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Create a step from an async action.
    pub fn new<F, Fut>(order: u32, name: impl Into<String>, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = SanarResult<()>> + Send + 'static,
    {
        Self {
            order,
            name: name.into(),
            action: Box::new(move || Box::pin(action())),
        }
    }
}

/// Result of running a single step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Declared order index
    pub order: u32,
    /// Step name
    pub name: String,
    /// Whether the step passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Step duration
    pub duration: Duration,
}

/// Results from running a plan.
#[derive(Debug, Clone)]
pub struct PlanReport {
    /// Plan name
    pub plan_name: String,
    /// Individual step results, in execution order
    pub results: Vec<StepResult>,
    /// Total duration
    pub duration: Duration,
}

impl PlanReport {
    /// Check if all executed steps passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed steps.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed steps.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get failed steps.
    #[must_use]
    pub fn failures(&self) -> Vec<&StepResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// An explicit ordered list of named steps.
pub struct StepPlan {
    name: String,
    steps: Vec<Step>,
}

impl std::fmt::Debug for StepPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepPlan")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl StepPlan {
    /// Create an empty plan.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Add a step.
    #[must_use]
    pub fn step<F, Fut>(mut self, order: u32, name: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = SanarResult<()>> + Send + 'static,
    {
        self.steps.push(Step::new(order, name, action));
        self
    }

    /// Plan name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Verify the declared order indices are exactly `1..=n`.
    ///
    /// # Errors
    ///
    /// Fails with [`SanarError::Plan`] on duplicate or gapped indices.
    pub fn validate(&self) -> SanarResult<()> {
        let mut orders: Vec<u32> = self.steps.iter().map(|s| s.order).collect();
        orders.sort_unstable();
        for (i, &order) in orders.iter().enumerate() {
            let expected = u32::try_from(i + 1).unwrap_or(u32::MAX);
            if order == expected {
                continue;
            }
            let message = if i > 0 && orders[i - 1] == order {
                format!("duplicate order index {order} in plan '{}'", self.name)
            } else {
                format!(
                    "gapped order indices in plan '{}': expected {expected}, found {order}",
                    self.name
                )
            };
            return Err(SanarError::Plan { message });
        }
        Ok(())
    }

    /// Validate, then run the steps in declared order, stopping at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// Fails only on an invalid plan; step failures are reported in the
    /// returned [`PlanReport`].
    pub async fn run(mut self) -> SanarResult<PlanReport> {
        self.validate()?;
        self.steps.sort_by_key(|s| s.order);

        let start = Instant::now();
        let mut results = Vec::with_capacity(self.steps.len());

        for step in &mut self.steps {
            info!(plan = %self.name, order = step.order, step = %step.name, "running step");
            let step_start = Instant::now();
            let outcome = (step.action)().await;
            let duration = step_start.elapsed();

            match outcome {
                Ok(()) => results.push(StepResult {
                    order: step.order,
                    name: step.name.clone(),
                    passed: true,
                    error: None,
                    duration,
                }),
                Err(e) => {
                    error!(plan = %self.name, step = %step.name, error = %e, "step failed");
                    results.push(StepResult {
                        order: step.order,
                        name: step.name.clone(),
                        passed: false,
                        error: Some(e.to_string()),
                        duration,
                    });
                    break;
                }
            }
        }

        Ok(PlanReport {
            plan_name: self.name,
            results,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_step() -> impl FnMut() -> StepFuture + Send {
        || Box::pin(async { Ok(()) })
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_contiguous_indices_valid() {
            let plan = StepPlan::new("login")
                .step(1, "open", ok_step())
                .step(2, "fill", ok_step())
                .step(3, "submit", ok_step());
            assert!(plan.validate().is_ok());
        }

        #[test]
        fn test_duplicate_index_rejected() {
            let plan = StepPlan::new("login")
                .step(1, "open", ok_step())
                .step(1, "fill", ok_step());
            let err = plan.validate().unwrap_err();
            assert!(matches!(err, SanarError::Plan { message } if message.contains("duplicate")));
        }

        #[test]
        fn test_gapped_index_rejected() {
            let plan = StepPlan::new("login")
                .step(1, "open", ok_step())
                .step(3, "submit", ok_step());
            let err = plan.validate().unwrap_err();
            assert!(matches!(err, SanarError::Plan { message } if message.contains("gapped")));
        }

        #[test]
        fn test_zero_index_rejected() {
            let plan = StepPlan::new("login").step(0, "open", ok_step());
            assert!(plan.validate().is_err());
        }

        #[test]
        fn test_empty_plan_valid() {
            assert!(StepPlan::new("noop").validate().is_ok());
        }
    }

    mod execution_tests {
        use super::*;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        #[tokio::test]
        async fn test_runs_in_declared_order() {
            let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
            let mk = |label: &'static str, seen: Arc<std::sync::Mutex<Vec<&'static str>>>| {
                move || {
                    let seen = seen.clone();
                    Box::pin(async move {
                        seen.lock().unwrap().push(label);
                        Ok(())
                    }) as StepFuture
                }
            };

            // Registered out of order; executed by declared index.
            let report = StepPlan::new("login")
                .step(2, "fill", mk("fill", seen.clone()))
                .step(1, "open", mk("open", seen.clone()))
                .step(3, "submit", mk("submit", seen.clone()))
                .run()
                .await
                .unwrap();

            assert!(report.all_passed());
            assert_eq!(*seen.lock().unwrap(), vec!["open", "fill", "submit"]);
        }

        #[tokio::test]
        async fn test_stops_at_first_failure() {
            let ran = Arc::new(AtomicUsize::new(0));
            let ran_late = ran.clone();

            let report = StepPlan::new("login")
                .step(1, "open", ok_step())
                .step(2, "explode", || {
                    Box::pin(async { Err(SanarError::probe("boom")) }) as StepFuture
                })
                .step(3, "never", move || {
                    ran_late.fetch_add(1, Ordering::SeqCst);
                    Box::pin(async { Ok(()) }) as StepFuture
                })
                .run()
                .await
                .unwrap();

            assert!(!report.all_passed());
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.results.len(), 2);
            assert_eq!(ran.load(Ordering::SeqCst), 0);

            let failures = report.failures();
            assert_eq!(failures[0].name, "explode");
            assert!(failures[0].error.as_deref().unwrap().contains("boom"));
        }

        #[tokio::test]
        async fn test_invalid_plan_does_not_run() {
            let ran = Arc::new(AtomicUsize::new(0));
            let ran_inner = ran.clone();
            let err = StepPlan::new("bad")
                .step(2, "only", move || {
                    ran_inner.fetch_add(1, Ordering::SeqCst);
                    Box::pin(async { Ok(()) }) as StepFuture
                })
                .run()
                .await
                .unwrap_err();
            assert!(matches!(err, SanarError::Plan { .. }));
            assert_eq!(ran.load(Ordering::SeqCst), 0);
        }
    }
}
