//! Declarative scenario model
//!
//! Scenarios are built in code by the page object, but the model stays
//! serializable so a run can dump exactly what it is about to execute.

use serde::{Deserialize, Serialize};

use crate::api::ResponseExpectation;
use crate::config::Viewport;
use crate::error::{E2eError, E2eResult};

/// A complete test scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport override; the configured viewport is used when absent
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

/// A single step in a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Clear an input field
    Clear {
        selector: String,
    },

    /// Type text with keyboard simulation
    Type {
        selector: String,
        text: String,
        #[serde(default)]
        clear_first: bool,
        /// Press Enter after the text
        #[serde(default)]
        submit: bool,
    },

    /// Wait for an element to reach a state
    Wait {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        state: WaitState,
    },

    /// Assert something about an element, retrying until the timeout
    Assert {
        selector: String,
        /// Narrow the selector to elements containing this text
        #[serde(default)]
        filter_text: Option<String>,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        disabled: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Clear local storage for the current origin
    ClearLocalStorage,

    /// Start observing responses to a request
    Intercept {
        alias: String,
        method: String,
        /// URL glob (`*` within a segment, `**` across segments)
        url: String,
    },

    /// Wait for an intercepted response and check it
    WaitForResponse {
        alias: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        expect: ResponseExpectation,
    },

    /// Stop failing the scenario on uncaught page exceptions
    IgnoreUncaughtExceptions {
        reason: String,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    pub value: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
}

impl TestStep {
    /// Short label used in logs and results
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Clear { selector } => format!("clear:{}", selector),
            TestStep::Type { selector, .. } => format!("type:{}", selector),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Assert { selector, filter_text: Some(text), .. } => {
                format!("assert:{}:{}", selector, text)
            }
            TestStep::Assert { selector, .. } => format!("assert:{}", selector),
            TestStep::ClearLocalStorage => "clear-local-storage".to_string(),
            TestStep::Intercept { alias, .. } => format!("intercept:@{}", alias),
            TestStep::WaitForResponse { alias, .. } => format!("wait:@{}", alias),
            TestStep::IgnoreUncaughtExceptions { .. } => "ignore-uncaught-exceptions".to_string(),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_yaml(&self) -> E2eResult<String> {
        serde_yaml::to_string(self).map_err(E2eError::from)
    }

    /// Every awaited response must have been intercepted by an earlier step
    pub fn validate(&self) -> E2eResult<()> {
        let mut intercepted: Vec<&str> = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                TestStep::Intercept { alias, .. } => intercepted.push(alias.as_str()),
                TestStep::WaitForResponse { alias, .. } if !intercepted.contains(&alias.as_str()) => {
                    return Err(E2eError::SpecParse(format!(
                        "{}: step {} waits for '@{}' before it is intercepted",
                        self.name,
                        i + 1,
                        alias
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_spec() {
        let yaml = r#"
name: register-smoke
description: Open the registration form
tags:
  - registration
  - smoke
steps:
  - action: navigate
    url: /register
    wait_for_selector: '#email'
  - action: type
    selector: '#email'
    text: test@test.com
    clear_first: true
  - action: assert
    selector: '.help-block'
    filter_text: Invalid email address
    visible: true
  - action: clear_local_storage
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "register-smoke");
        assert_eq!(spec.steps.len(), 4);
        assert!(spec.has_tag("smoke"));
        assert_eq!(spec.steps[3], TestStep::ClearLocalStorage);
    }

    #[test]
    fn test_wait_before_intercept_is_rejected() {
        let yaml = r#"
name: broken
steps:
  - action: wait_for_response
    alias: registerApi
  - action: intercept
    alias: registerApi
    method: POST
    url: '**/register'
"#;
        let err = TestSpec::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, E2eError::SpecParse(_)));
    }

    #[test]
    fn test_response_expectation_from_yaml() {
        let yaml = r#"
name: intercepted
steps:
  - action: intercept
    alias: registerApi
    method: POST
    url: '**/register'
  - action: wait_for_response
    alias: registerApi
    timeout_ms: 30000
    expect:
      status: 400
      body_contains:
        - path: result
          contains: ERROR_EMAIL_IN_USE
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        match &spec.steps[1] {
            TestStep::WaitForResponse { expect, timeout_ms, .. } => {
                assert_eq!(expect.status, Some(400));
                assert_eq!(*timeout_ms, Some(30000));
                assert_eq!(expect.body_contains[0].contains, "ERROR_EMAIL_IN_USE");
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_step_names() {
        let step = TestStep::Assert {
            selector: ".help-block".to_string(),
            filter_text: Some("City is too short".to_string()),
            visible: Some(true),
            disabled: None,
            text: None,
            text_contains: None,
            attribute: None,
            timeout_ms: None,
        };
        assert_eq!(step.name(), "assert:.help-block:City is too short");
        assert_eq!(TestStep::ClearLocalStorage.name(), "clear-local-storage");
    }
}
