//! Sanar: Self-Healing Locator Resolution for Browser Test Automation
//!
//! Sanar (Spanish: "to heal") keeps Page-Object locator tables alive: when a
//! stored CSS/XPath selector stops matching the page, the resolver asks an
//! external suggestion service for a replacement, re-verifies the candidate
//! against live page state, and persists the correction back to the table's
//! CSV file, only after it verified.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     SANAR Resolution Flow                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  name ──► LocatorStore ──► PageProbe.verify ──► Ok: selector     │
//! │              (CSV)              │                                │
//! │                              failed                              │
//! │                                 ▼                                │
//! │          SuggestionService.suggest(markup, name, prior)          │
//! │                                 │                                │
//! │                   candidate ──► PageProbe.verify                 │
//! │                                 │                                │
//! │              Ok: persist + return (healed)  │  Err: surface      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table never degrades: a candidate that fails re-verification is
//! discarded without touching the store, and there is exactly one repair
//! attempt per resolution: no retry loops, no cached failures.
//!
//! # Example
//!
//! ```ignore
//! use sanar::{LocatorStore, MockProbe, Resolver, StaticSuggester};
//! use std::sync::Arc;
//!
//! let store = LocatorStore::load("object_repository/Login_Elements.csv")?;
//! let mut resolver = Resolver::new(store)
//!     .with_suggester(Arc::new(StaticSuggester::suggesting("#login-submit")));
//!
//! let resolution = resolver.resolve(&probe, "btnLogin").await?;
//! if resolution.healed {
//!     // the CSV file now carries the repaired selector
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod fixture;
pub mod locator;
pub mod page_object;
pub mod plan;
pub mod probe;
pub mod resolver;
pub mod result;
pub mod store;
pub mod suggest;
pub mod validate;

#[cfg(feature = "browser")]
pub mod cdp;

pub use config::Settings;
pub use fixture::{Fixture, FixtureManager, FixtureState};
pub use locator::{LocatorEntry, Selector};
pub use page_object::{PageObject, PageSet, PageSetBuilder};
pub use plan::{PlanReport, Step, StepPlan, StepResult};
pub use probe::{MockProbe, PageProbe, ProbeOptions};
pub use resolver::{Resolution, Resolver};
pub use result::{SanarError, SanarResult};
pub use store::LocatorStore;
pub use suggest::{extract_candidate, StaticSuggester, SuggestionService};

#[cfg(feature = "llm")]
pub use suggest::{LlmSuggester, SuggesterConfig};

#[cfg(feature = "browser")]
pub use cdp::{CdpProbe, CdpProbeConfig};
