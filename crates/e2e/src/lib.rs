//! Pixel.bet registration E2E suite
//!
//! This crate drives a real browser through the pixel.bet registration flow:
//! - Generates fresh users for every run
//! - Describes the registration form through a page object
//! - Renders each scenario into a single Playwright script run under Node
//! - Intercepts the registration POST and checks the API response
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── preflight()          target reachable, Playwright ok │
//! │    ├── run_spec(spec)   -> TestResult                       │
//! │    └── dry_run(specs)   -> generated scripts + YAML plans   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  scenarios  ──uses──>  RegistrationPage  ──emits──> TestStep│
//! │      │                                                      │
//! │      └──uses──> fixtures (GeneratedUser, dates)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightHandle                                           │
//! │    ├── build_script(spec)   one browser context per spec    │
//! │    ├── run_script(js)   -> @@e2e events on stdout           │
//! │    └── collect_results  -> StepResult (+ response checks)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod page;
pub mod playwright;
pub mod rules;
pub mod runner;
pub mod scenarios;
pub mod spec;
pub mod target;

pub use config::E2eConfig;
pub use error::{E2eError, E2eResult};
pub use page::RegistrationPage;
pub use runner::TestRunner;
pub use spec::{TestSpec, TestStep};
