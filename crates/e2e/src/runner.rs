//! Main test runner that orchestrates preflight, Playwright and reporting

use std::path::PathBuf;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::E2eConfig;
use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::spec::TestSpec;
use crate::target::{self, TargetConfig};

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            skipped: 0,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Harness exit status: every scenario passed
pub const EXIT_PASSED: u8 = 0;

/// Harness exit status: at least one scenario failed
pub const EXIT_FAILED: u8 = 1;

/// Harness exit status: the run could not be carried out
pub const EXIT_ERROR: u8 = 2;

/// Map the outcome of a whole run to the harness exit status
pub fn exit_status(outcome: &E2eResult<bool>) -> u8 {
    match outcome {
        Ok(true) => EXIT_PASSED,
        Ok(false) => EXIT_FAILED,
        Err(_) => EXIT_ERROR,
    }
}

/// Which scenarios to run
#[derive(Debug, Clone, Default)]
pub enum Selection {
    #[default]
    All,
    Tag(String),
    Name(String),
}

impl Selection {
    /// Narrow `specs` to the selection; naming an unknown scenario is an error
    pub fn apply(&self, specs: Vec<TestSpec>) -> E2eResult<Vec<TestSpec>> {
        match self {
            Selection::All => Ok(specs),
            Selection::Tag(tag) => Ok(specs.into_iter().filter(|s| s.has_tag(tag)).collect()),
            Selection::Name(name) => specs
                .into_iter()
                .find(|s| &s.name == name)
                .map(|s| vec![s])
                .ok_or_else(|| E2eError::ScenarioNotFound(name.clone())),
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: E2eConfig,

    /// Set once the target and Playwright have been checked
    ready: bool,
}

impl TestRunner {
    pub fn new(config: E2eConfig) -> Self {
        Self { config, ready: false }
    }

    pub fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Check Playwright is installed and the target answers
    pub async fn preflight(&mut self) -> E2eResult<()> {
        if self.ready {
            return Ok(());
        }

        PlaywrightHandle::check_playwright_installed()?;
        target::wait_for_reachable(&TargetConfig {
            base_url: self.config.base_url().to_string(),
            timeout: Duration::from_millis(self.config.network_timeout_ms),
            ..Default::default()
        })
        .await?;

        self.ready = true;
        Ok(())
    }

    fn playwright(&self) -> E2eResult<PlaywrightHandle> {
        PlaywrightHandle::new(PlaywrightConfig::from_config(&self.config)?)
    }

    /// Run a list of test specs, one after another
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        self.preflight().await?;

        info!("Running {} test(s) against {}", specs.len(), self.config.base_url());

        let mut results = Vec::new();
        for spec in specs {
            let result = match self.run_spec(spec).await {
                Ok(result) => result,
                Err(e) => self.failed_or_abort(spec, e)?,
            };

            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        let suite = TestSuiteResult::from_results(results, start.elapsed().as_millis() as u64);

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );

        Ok(suite)
    }

    /// Run a single test spec
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        spec.validate()?;
        self.save_script(spec)?;

        let steps = self.playwright()?.run_spec(spec).await?;
        let error = steps.iter().find(|s| !s.success).and_then(|s| s.error.clone());

        Ok(TestResult {
            name: spec.name.clone(),
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error,
        })
    }

    /// A timed-out scenario becomes a failed result so the rest still run;
    /// any other error aborts the suite
    fn failed_or_abort(&self, spec: &TestSpec, error: E2eError) -> E2eResult<TestResult> {
        match error {
            E2eError::Timeout(_) => Ok(TestResult {
                name: spec.name.clone(),
                success: false,
                duration_ms: self.config.scenario_timeout_ms,
                steps: vec![],
                error: Some(error.to_string()),
            }),
            other => Err(other),
        }
    }

    /// Write the generated script and the YAML plan for a spec
    pub fn save_script(&self, spec: &TestSpec) -> E2eResult<PathBuf> {
        let dir = self.config.scripts_dir();
        std::fs::create_dir_all(&dir)?;

        let script = self.playwright()?.build_script(spec);
        let path = dir.join(format!("{}.js", spec.name));
        std::fs::write(&path, script)?;
        std::fs::write(dir.join(format!("{}.yaml", spec.name)), spec.to_yaml()?)?;

        debug!("Script written to: {}", path.display());
        Ok(path)
    }

    /// Render every spec without launching a browser
    pub fn dry_run(&self, specs: &[TestSpec]) -> E2eResult<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(specs.len());
        for spec in specs {
            spec.validate()?;
            let path = self.save_script(spec)?;
            info!("{}: {} steps -> {}", spec.name, spec.steps.len(), path.display());
            paths.push(path);
        }
        Ok(paths)
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
