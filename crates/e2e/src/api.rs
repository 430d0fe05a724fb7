//! Registration API contract and response expectations
//!
//! The browser script captures the intercepted response verbatim; the checks
//! here run on the Rust side once the capture comes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{E2eError, E2eResult};

pub const RESULT_SUCCESS: &str = "SUCCESS";
pub const RESULT_EMAIL_IN_USE: &str = "ERROR_EMAIL_IN_USE";

/// Body of the registration endpoint's response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub result: String,
    #[serde(default)]
    pub user: Option<RegisteredUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub city: String,
    pub street: String,
    pub post_code: String,
    pub date_of_birth: String,
}

/// A response observed by an intercept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub alias: String,
    pub url: String,
    pub status: u16,
    /// Parsed JSON body, or a string if the body was not JSON
    pub body: Value,
}

impl CapturedResponse {
    /// Decode the body as a registration response
    pub fn register_body(&self) -> E2eResult<RegisterResponse> {
        serde_json::from_value(self.body.clone()).map_err(E2eError::from)
    }
}

/// What an awaited response must look like
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseExpectation {
    #[serde(default)]
    pub status: Option<u16>,

    /// Dotted JSON paths whose string value must contain the given text
    #[serde(default)]
    pub body_contains: Vec<BodyField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyField {
    pub path: String,
    pub contains: String,
}

impl ResponseExpectation {
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            body_contains: Vec::new(),
        }
    }

    /// Require `path` (e.g. `user.countryCode`) to contain `text`
    pub fn contains(mut self, path: &str, text: impl Into<String>) -> Self {
        self.body_contains.push(BodyField {
            path: path.to_string(),
            contains: text.into(),
        });
        self
    }

    /// Check a captured response, reporting the first mismatch
    pub fn verify(&self, response: &CapturedResponse) -> E2eResult<()> {
        let mismatch = |reason: String| E2eError::ResponseMismatch {
            alias: response.alias.clone(),
            reason,
        };

        if let Some(expected) = self.status {
            if response.status != expected {
                return Err(mismatch(format!(
                    "expected status {}, got {}",
                    expected, response.status
                )));
            }
        }

        for field in &self.body_contains {
            let actual = lookup(&response.body, &field.path)
                .ok_or_else(|| mismatch(format!("body has no field '{}'", field.path)))?;
            let text = match actual {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if !text.contains(&field.contains) {
                return Err(mismatch(format!(
                    "'{}' = {:?} does not contain {:?}",
                    field.path, text, field.contains
                )));
            }
        }

        Ok(())
    }
}

/// Resolve a dotted path against a JSON value
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}
