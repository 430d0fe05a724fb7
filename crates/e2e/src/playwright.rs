//! Playwright browser automation
//!
//! A scenario is rendered into one Node script so the browser context (cookies,
//! local storage, pending intercepts) lives for the whole scenario. The script
//! reports progress as `@@e2e {json}` lines on stdout.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::api::CapturedResponse;
use crate::config::{E2eConfig, Viewport};
use crate::error::{E2eError, E2eResult};
use crate::spec::{TestSpec, TestStep};

/// Prefix marking a driver event on the script's stdout
pub const EVENT_PREFIX: &str = "@@e2e ";

/// Interval between polls of a retried assertion
const POLL_INTERVAL_MS: u64 = 100;

/// Per-key delay when typing
const TYPE_DELAY_MS: u64 = 20;

/// In-script response checks; a mismatch throws before the next step.
/// Messages match `ResponseExpectation::verify`.
const RESPONSE_CHECKS_JS: &str = r#"
function lookup(value, path) {
  return path.split('.').reduce((current, key) => (current == null ? undefined : current[key]), value);
}

function checkResponse(alias, captured, expect) {
  const mismatch = (reason) => new Error(`Response mismatch for '${alias}': ${reason}`);
  if (expect.status != null && captured.status !== expect.status) {
    throw mismatch(`expected status ${expect.status}, got ${captured.status}`);
  }
  for (const field of expect.body_contains || []) {
    const actual = lookup(captured.body, field.path);
    if (actual === undefined) {
      throw mismatch(`body has no field '${field.path}'`);
    }
    const text = typeof actual === 'string' ? actual : JSON.stringify(actual);
    if (!text.includes(field.contains)) {
      throw mismatch(`'${field.path}' = ${JSON.stringify(text)} does not contain ${JSON.stringify(field.contains)}`);
    }
  }
}
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
    /// Response captured by a `wait_for_response` step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<CapturedResponse>,
}

/// A progress event printed by the generated script
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DriverEvent {
    /// Step `index` completed
    Step { index: usize, duration_ms: u64 },

    /// Step `index` observed an intercepted response
    Response { index: usize, response: CapturedResponse },

    /// The script stopped; `index` is the failing step, if one was running
    Failed {
        index: Option<usize>,
        error: String,
        #[serde(default)]
        screenshot: Option<PathBuf>,
        #[serde(default)]
        duration_ms: u64,
    },

    /// Every step completed
    Done,
}

/// Everything a script run produced
#[derive(Debug, Clone, Default)]
pub struct ScriptOutcome {
    pub events: Vec<DriverEvent>,
    pub exit_success: bool,
    pub stderr: String,
}

/// Parse one stdout line into a driver event, if it is one
pub fn parse_event(line: &str) -> Option<DriverEvent> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(&format!(r"^{}(\{{.*\}})\s*$", regex::escape(EVENT_PREFIX)))
            .expect("event pattern is a valid regex")
    });

    let payload = pattern.captures(line)?.get(1)?.as_str();
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Malformed driver event ({}): {}", e, payload);
            None
        }
    }
}

/// Translate a URL glob into an anchored regex source
///
/// `**` matches across path segments, `*` within one.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut rest = glob;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('*') {
            out.push_str("[^/]*");
            rest = tail;
        } else {
            let end = rest.find('*').unwrap_or(rest.len());
            out.push_str(&regex::escape(&rest[..end]));
            rest = &rest[end..];
        }
    }
    out.push('$');
    out
}

/// Quote a string as a JavaScript literal
fn js(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    /// Base URL of the application under test
    base_url: String,

    /// Directory for failure screenshots
    screenshot_dir: PathBuf,

    viewport: Viewport,
    browser: Browser,
    headless: bool,

    /// Timeout for steps that don't set their own
    default_timeout_ms: u64,

    /// Upper bound on one script run
    scenario_timeout: Duration,

    /// Prepended to every script
    support_script: Option<String>,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self {
            base_url: config.base_url,
            screenshot_dir: config.screenshot_dir,
            viewport: config.viewport,
            browser: config.browser,
            headless: config.headless,
            default_timeout_ms: config.default_timeout_ms,
            scenario_timeout: config.scenario_timeout,
            support_script: config.support_script,
        })
    }

    /// Check if Playwright is installed
    pub fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    fn failure_screenshot(&self, spec_name: &str) -> PathBuf {
        self.screenshot_dir.join(format!("{}-failure.png", spec_name))
    }

    /// Build the Playwright script for a scenario
    pub fn build_script(&self, spec: &TestSpec) -> String {
        let viewport = spec.viewport.unwrap_or(self.viewport);
        let mut script = String::new();

        // Header
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

const PREFIX = {prefix};
const emit = (event) => console.log(PREFIX + JSON.stringify(event));

async function until(description, timeout, check) {{
  const deadline = Date.now() + timeout;
  let last = null;
  for (;;) {{
    try {{
      if (await check()) return;
    }} catch (error) {{
      last = error;
    }}
    if (Date.now() > deadline) {{
      throw new Error(`Timed out after ${{timeout}}ms: ${{description}}` + (last ? ` (${{last.message}})` : ''));
    }}
    await new Promise((resolve) => setTimeout(resolve, {poll}));
  }}
}}

function withTimeout(promise, timeout, description) {{
  let timer;
  const expiry = new Promise((_, reject) => {{
    timer = setTimeout(() => reject(new Error(`Timed out after ${{timeout}}ms: ${{description}}`)), timeout);
  }});
  return Promise.race([promise, expiry]).finally(() => clearTimeout(timer));
}}

async function readBody(response) {{
  const text = await response.text().catch(() => '');
  try {{
    return JSON.parse(text);
  }} catch (_) {{
    return text;
  }}
}}
"#,
            prefix = js(EVENT_PREFIX),
            poll = POLL_INTERVAL_MS,
        ));
        script.push_str(RESPONSE_CHECKS_JS);

        if let Some(support) = &self.support_script {
            script.push_str("\n// Support file\n");
            script.push_str(support);
            script.push('\n');
        }

        script.push_str(&format!(
            r#"
(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  const timeout = {timeout};
  page.setDefaultTimeout(timeout);

  const intercepts = {{}};
  const pageErrors = [];
  let ignoreUncaught = false;
  page.on('pageerror', (error) => pageErrors.push(error.message));
  const checkPageErrors = () => {{
    if (!ignoreUncaught && pageErrors.length > 0) {{
      throw new Error('Uncaught exception in page: ' + pageErrors.join('; '));
    }}
  }};

  let current = null;
  let started = Date.now();
  try {{
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            width = viewport.width,
            height = viewport.height,
            base_url = js(&self.base_url),
            timeout = self.default_timeout_ms,
        ));

        // Generate step code
        for (i, step) in spec.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&format!("    current = {}; started = Date.now();\n", i));
            script.push_str(&self.step_to_js(step, i));
            script.push_str(&format!(
                "\n    checkPageErrors();\n    emit({{ event: 'step', index: {}, duration_ms: Date.now() - started }});\n",
                i
            ));
        }

        // Footer
        script.push_str(&format!(
            r#"
    emit({{ event: 'done' }});
  }} catch (error) {{
    const screenshot = {screenshot};
    const shot = await page.screenshot({{ path: screenshot, fullPage: true }}).then(() => screenshot, () => null);
    emit({{ event: 'failed', index: current, error: error.message, screenshot: shot, duration_ms: Date.now() - started }});
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})().catch((error) => {{
  emit({{ event: 'failed', index: null, error: error.message }});
  process.exitCode = 1;
}});
"#,
            screenshot = js(&self.failure_screenshot(&spec.name).to_string_lossy()),
        ));

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &TestStep, step_index: usize) -> String {
        match step {
            TestStep::Navigate { url, wait_for_selector } => {
                let target = if url.starts_with("http://") || url.starts_with("https://") {
                    js(url)
                } else {
                    format!("baseUrl + {}", js(url))
                };
                let wait = wait_for_selector
                    .as_ref()
                    .map(|s| format!("\n    await page.waitForSelector({});", js(s)))
                    .unwrap_or_default();
                format!("    await page.goto({});{}", target, wait)
            }
            TestStep::Click { selector, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(self.default_timeout_ms);
                format!(
                    "    await page.locator({}).first().click({{ timeout: {} }});",
                    js(selector),
                    timeout
                )
            }
            TestStep::Clear { selector } => {
                format!("    await page.locator({}).first().clear();", js(selector))
            }
            TestStep::Type { selector, text, clear_first, submit } => {
                let mut lines = vec![format!("    {{\n      const el = page.locator({}).first();", js(selector))];
                if *clear_first {
                    lines.push("      await el.clear();".to_string());
                }
                lines.push(format!(
                    "      await el.pressSequentially({}, {{ delay: {} }});",
                    js(text),
                    TYPE_DELAY_MS
                ));
                if *submit {
                    lines.push("      await page.keyboard.press('Enter');".to_string());
                }
                lines.push("    }".to_string());
                lines.join("\n")
            }
            TestStep::Wait { selector, timeout_ms, state } => {
                format!(
                    "    await page.locator({}).first().waitFor({{ state: '{}', timeout: {} }});",
                    js(selector),
                    state.as_str(),
                    timeout_ms.unwrap_or(self.default_timeout_ms)
                )
            }
            TestStep::Assert {
                selector,
                filter_text,
                visible,
                disabled,
                text,
                text_contains,
                attribute,
                timeout_ms,
            } => {
                let timeout = timeout_ms.unwrap_or(self.default_timeout_ms);
                // A RegExp keeps the match case-sensitive; a plain string would not
                let filter = filter_text
                    .as_ref()
                    .map(|t| format!(".filter({{ hasText: new RegExp({}) }})", js(&regex::escape(t))))
                    .unwrap_or_default();
                let mut checks = vec![format!(
                    "    {{\n      const el = page.locator({}){}.first();",
                    js(selector),
                    filter
                )];
                let mut check = |description: String, predicate: String| {
                    checks.push(format!(
                        "      await until({}, {}, async () => {});",
                        js(&description),
                        timeout,
                        predicate
                    ));
                };

                if let Some(vis) = visible {
                    check(
                        format!("{} {}", step.name(), if *vis { "visible" } else { "hidden" }),
                        format!("(await el.isVisible()) === {}", vis),
                    );
                }
                if let Some(dis) = disabled {
                    check(
                        format!("{} {}", step.name(), if *dis { "disabled" } else { "enabled" }),
                        format!("(await el.isDisabled({{ timeout: 250 }})) === {}", dis),
                    );
                }
                if let Some(t) = text {
                    check(
                        format!("{} has text {}", step.name(), js(t)),
                        format!("((await el.textContent({{ timeout: 250 }})) || '').trim() === {}", js(t)),
                    );
                }
                if let Some(tc) = text_contains {
                    check(
                        format!("{} contains {}", step.name(), js(tc)),
                        format!("((await el.textContent({{ timeout: 250 }})) || '').includes({})", js(tc)),
                    );
                }
                if let Some(attr) = attribute {
                    let read = format!("(await el.getAttribute({}, {{ timeout: 250 }}))", js(&attr.name));
                    if let Some(val) = &attr.value {
                        check(
                            format!("{} [{}={}]", step.name(), attr.name, val),
                            format!("{} === {}", read, js(val)),
                        );
                    }
                    if let Some(part) = &attr.contains {
                        check(
                            format!("{} [{}*={}]", step.name(), attr.name, part),
                            format!("({} || '').includes({})", read, js(part)),
                        );
                    }
                }

                checks.push("    }".to_string());
                checks.join("\n")
            }
            TestStep::ClearLocalStorage => {
                "    await page.evaluate(() => window.localStorage.clear());".to_string()
            }
            TestStep::Intercept { alias, method, url } => {
                format!(
                    r#"    {{
      const pattern = new RegExp({pattern});
      intercepts[{alias}] = page.waitForResponse(
        (response) => response.request().method() === {method} && pattern.test(response.url()),
        {{ timeout: 0 }}
      );
      intercepts[{alias}].catch(() => null);
    }}"#,
                    pattern = js(&glob_to_regex(url)),
                    alias = js(alias),
                    method = js(&method.to_uppercase()),
                )
            }
            TestStep::WaitForResponse { alias, timeout_ms, expect } => {
                let expect = serde_json::to_string(expect).unwrap_or_else(|_| "{}".to_string());
                format!(
                    r#"    {{
      const response = await withTimeout(intercepts[{alias}], {timeout}, {description});
      const captured = {{ alias: {alias}, url: response.url(), status: response.status(), body: await readBody(response) }};
      emit({{ event: 'response', index: {index}, response: captured }});
      checkResponse({alias}, captured, {expect});
    }}"#,
                    alias = js(alias),
                    timeout = timeout_ms.unwrap_or(self.default_timeout_ms),
                    description = js(&format!("response for @{}", alias)),
                    index = step_index,
                    expect = expect,
                )
            }
            TestStep::IgnoreUncaughtExceptions { reason } => {
                format!("    // {}\n    ignoreUncaught = true;", reason.replace('\n', " "))
            }
            TestStep::Log { message } => {
                format!("    console.log('[TEST] ' + {});", js(message))
            }
        }
    }

    /// Execute a generated script via Node
    pub async fn run_script(&self, script: &str) -> E2eResult<ScriptOutcome> {
        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .env("NODE_PATH", node_path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("Failed to start node: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("node stdout was not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| E2eError::Playwright("node stderr was not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let read_events = async {
            let mut events = Vec::new();
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                match parse_event(&line) {
                    Some(event) => {
                        debug!("Driver event: {:?}", event);
                        events.push(event);
                    }
                    None => info!("{}", line),
                }
            }
            Ok::<_, E2eError>(events)
        };

        let events = match tokio::time::timeout(self.scenario_timeout, read_events).await {
            Ok(events) => events?,
            Err(_) => {
                terminate(&mut child).await;
                return Err(E2eError::Timeout(format!(
                    "scenario script to finish within {:?}",
                    self.scenario_timeout
                )));
            }
        };

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        Ok(ScriptOutcome {
            events,
            exit_success: status.success(),
            stderr,
        })
    }

    /// Run a whole scenario in one browser session
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(spec);
        let outcome = self.run_script(&script).await?;
        if !outcome.exit_success && !outcome.stderr.trim().is_empty() {
            debug!("node stderr for {}: {}", spec.name, outcome.stderr.trim());
        }
        Ok(collect_results(&spec.steps, &outcome))
    }
}

/// Turn driver events into per-step results, stopping at the first failure
///
/// Response expectations are checked here, against the captured response.
pub fn collect_results(steps: &[TestStep], outcome: &ScriptOutcome) -> Vec<StepResult> {
    let step_name = |index: usize| {
        steps
            .get(index)
            .map(TestStep::name)
            .unwrap_or_else(|| format!("step-{}", index + 1))
    };

    let mut results = Vec::new();
    let mut responses: HashMap<usize, CapturedResponse> = HashMap::new();

    for event in &outcome.events {
        match event {
            DriverEvent::Response { index, response } => {
                responses.insert(*index, response.clone());
            }
            DriverEvent::Step { index, duration_ms } => {
                let response = responses.remove(index);
                let error = match (steps.get(*index), &response) {
                    (Some(TestStep::WaitForResponse { expect, .. }), Some(captured)) => {
                        expect.verify(captured).err().map(|e| e.to_string())
                    }
                    (Some(TestStep::WaitForResponse { alias, .. }), None) => {
                        Some(format!("no response captured for '@{}'", alias))
                    }
                    _ => None,
                };
                let failed = error.is_some();
                results.push(StepResult {
                    success: !failed,
                    step_name: step_name(*index),
                    duration_ms: *duration_ms,
                    error,
                    screenshot_path: None,
                    response,
                });
                if failed {
                    return results;
                }
            }
            DriverEvent::Failed { index, error, screenshot, duration_ms } => {
                let name = index.map(step_name).unwrap_or_else(|| "browser".to_string());
                let response = index.and_then(|i| responses.remove(&i));
                let reason = E2eError::StepFailed {
                    step: name.clone(),
                    reason: error.clone(),
                };
                results.push(StepResult {
                    success: false,
                    step_name: name,
                    duration_ms: *duration_ms,
                    error: Some(reason.to_string()),
                    screenshot_path: screenshot.clone(),
                    response,
                });
                return results;
            }
            DriverEvent::Done => return results,
        }
    }

    // The script died without reporting either completion or a failure.
    let stderr = outcome.stderr.trim();
    let reason = if stderr.is_empty() {
        "script exited without reporting completion".to_string()
    } else {
        stderr.to_string()
    };
    results.push(StepResult {
        success: false,
        step_name: "browser".to_string(),
        duration_ms: 0,
        error: Some(E2eError::Playwright(reason).to_string()),
        screenshot_path: None,
        response: None,
    });
    results
}

/// Stop a runaway script, gracefully first
async fn terminate(child: &mut Child) {
    warn!("Terminating Playwright script (pid: {:?})", child.id());

    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(id) = child.id() {
            if kill(Pid::from_raw(id as i32), Signal::SIGTERM).is_ok() {
                // Give the browser a moment to close
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    // Force kill if still running
    let _ = child.kill().await;
}

/// Let `require('playwright')` resolve from the working directory's node_modules
fn node_path() -> OsString {
    let mut paths: Vec<PathBuf> = std::env::current_dir()
        .map(|dir| vec![dir.join("node_modules")])
        .unwrap_or_default();
    if let Some(existing) = std::env::var_os("NODE_PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_default()
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport: Viewport,
    pub browser: Browser,
    pub headless: bool,
    pub default_timeout_ms: u64,
    pub scenario_timeout: Duration,
    pub support_script: Option<String>,
}

impl PlaywrightConfig {
    pub fn from_config(config: &E2eConfig) -> E2eResult<Self> {
        Ok(Self {
            base_url: config.base_url().to_string(),
            screenshot_dir: config.screenshot_dir(),
            viewport: config.viewport,
            browser: config.browser,
            headless: config.headless,
            default_timeout_ms: config.default_command_timeout_ms,
            scenario_timeout: config.scenario_timeout(),
            support_script: config.support_script()?,
        })
    }
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pixel.bet".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport: Viewport::default(),
            browser: Browser::Chromium,
            headless: true,
            default_timeout_ms: 6000,
            scenario_timeout: Duration::from_secs(180),
            support_script: None,
        }
    }
}
