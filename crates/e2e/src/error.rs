//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npm i -D playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Response mismatch for '{alias}': {reason}")]
    ResponseMismatch { alias: String, reason: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
