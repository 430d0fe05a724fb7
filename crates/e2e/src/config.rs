//! Suite configuration
//!
//! Loaded from an optional YAML file (`e2e.yaml` by default). Every field has
//! a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;

/// Default location of the config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "e2e.yaml";

/// Top-level configuration for a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Application under test
    pub base_url: String,

    /// Timeout for element lookups and UI assertions
    pub default_command_timeout_ms: u64,

    /// Timeout for awaiting an intercepted API response
    pub network_timeout_ms: u64,

    /// Timeout for the third-party help widget to render
    pub widget_timeout_ms: u64,

    /// Upper bound on a whole scenario, including browser startup
    pub scenario_timeout_ms: u64,

    /// JS file prepended to every generated script (none by default)
    pub support_file: Option<PathBuf>,

    /// URL glob matched against the registration POST
    pub register_endpoint: String,

    /// Browser engine
    pub browser: Browser,

    /// Run the browser without a window
    pub headless: bool,

    /// Viewport size for the browser
    pub viewport: Viewport,

    /// Directory for results, scripts and screenshots
    pub output_dir: PathBuf,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pixel.bet".to_string(),
            default_command_timeout_ms: 6000,
            network_timeout_ms: 30000,
            widget_timeout_ms: 10000,
            scenario_timeout_ms: 180_000,
            support_file: None,
            register_endpoint: "**/register".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

impl E2eConfig {
    /// Load configuration from file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every scenario fail in confusing ways
    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        let timeouts = [
            ("default_command_timeout_ms", self.default_command_timeout_ms),
            ("network_timeout_ms", self.network_timeout_ms),
            ("widget_timeout_ms", self.widget_timeout_ms),
            ("scenario_timeout_ms", self.scenario_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(E2eError::Config(format!("{} must be non-zero", name)));
        }
        if self.register_endpoint.is_empty() {
            return Err(E2eError::Config("register_endpoint must not be empty".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, so paths can be appended directly
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.output_dir.join("scripts")
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }

    /// Read the support file, if one is configured
    pub fn support_script(&self) -> E2eResult<Option<String>> {
        match &self.support_file {
            Some(path) => std::fs::read_to_string(path).map(Some).map_err(|e| {
                E2eError::Config(format!("cannot read support file {}: {}", path.display(), e))
            }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults_point_at_pixel_bet() {
        let config = E2eConfig::default();
        assert_eq!(config.base_url(), "https://pixel.bet");
        assert_eq!(config.default_command_timeout_ms, 6000);
        assert_eq!(config.network_timeout_ms, 30000);
        assert_eq!(config.widget_timeout_ms, 10000);
        assert!(config.support_file.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
base_url: https://staging.pixel.bet/
browser: firefox
viewport:
  width: 1920
  height: 1080
"#;
        let config = E2eConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.base_url(), "https://staging.pixel.bet");
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.default_command_timeout_ms, 6000);
        assert_eq!(config.register_endpoint, "**/register");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = E2eConfig::from_yaml("base_url: pixel.bet").unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test_case("default_command_timeout_ms")]
    #[test_case("network_timeout_ms")]
    #[test_case("widget_timeout_ms")]
    #[test_case("scenario_timeout_ms")]
    fn test_rejects_zero_timeout(field: &str) {
        let err = E2eConfig::from_yaml(&format!("{}: 0", field)).unwrap_err();
        match err {
            E2eError::Config(message) => assert!(message.contains(field), "{message}"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = E2eConfig::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.base_url(), "https://pixel.bet");
    }

    #[test]
    fn test_support_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("support.js");
        std::fs::write(&path, "// support").unwrap();

        let config = E2eConfig {
            support_file: Some(path),
            ..Default::default()
        };
        assert_eq!(config.support_script().unwrap().as_deref(), Some("// support"));
    }
}
