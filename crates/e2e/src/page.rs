//! Page object for the registration form
//!
//! Each action or query appends steps to the scenario being built. Actions do
//! not verify anything themselves; queries become assertion steps that the
//! driver retries until their timeout.

use crate::api::ResponseExpectation;
use crate::config::E2eConfig;
use crate::rules::messages;
use crate::spec::{AttributeAssertion, TestStep, WaitState};

/// CSS selectors for the registration UI
pub mod locators {
    pub const REGISTER_BUTTON: &str = ".menu-text.register-button";
    pub const CONTINUE_BUTTON: &str = r#"button.btn-cta.cta-light.btn-login.register[type="submit"]"#;
    pub const COUNTRY_SELECTOR: &str = r#"[class*=dropdown-with-flags] div[class*="Select--single"]"#;
    pub const CITY: &str = "#city";
    pub const POSTCODE: &str = "#postCode";
    pub const STREET: &str = "#street";
    pub const EMAIL: &str = "#email";
    pub const FIRST_NAME: &str = "#firstName";
    pub const LAST_NAME: &str = "#lastName";
    pub const DATE_OF_BIRTH: &str = r#"input[name="dateOfBirth"]"#;
    pub const PASSWORD: &str = "#password";
    pub const TERMS_TOGGLE: &str = "[class=react-toggle]";
    pub const EMAIL_IN_USE_ERROR: &str = ".register-error";
    pub const ERROR_MESSAGES: &str = ".help-block";
    pub const TOGGLE_PASSWORD: &str = r#"span[class="toggle-password pixel-eye-icon"]"#;
    pub const GO_BACK: &str = ".goback";
    pub const HEADLINE: &str = ".headline";
    pub const NEED_HELP: &str = ".need-help";
    pub const HELP_WIDGET: &str = "#webWidget";
}

/// Alias under which the registration POST is intercepted
pub const REGISTER_ALIAS: &str = "registerApi";

/// Builds the steps for one scenario against the registration page
#[derive(Debug, Clone)]
pub struct RegistrationPage {
    steps: Vec<TestStep>,
    widget_timeout_ms: u64,
    network_timeout_ms: u64,
    register_endpoint: String,
}

impl RegistrationPage {
    pub fn new(config: &E2eConfig) -> Self {
        Self {
            steps: Vec::new(),
            widget_timeout_ms: config.widget_timeout_ms,
            network_timeout_ms: config.network_timeout_ms,
            register_endpoint: config.register_endpoint.clone(),
        }
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<TestStep> {
        self.steps
    }

    fn push(&mut self, step: TestStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    fn click(&mut self, selector: &str) -> &mut Self {
        self.push(TestStep::Click {
            selector: selector.to_string(),
            timeout_ms: None,
        })
    }

    fn replace_text(&mut self, selector: &str, text: &str) -> &mut Self {
        self.push(TestStep::Type {
            selector: selector.to_string(),
            text: text.to_string(),
            clear_first: true,
            submit: false,
        })
    }

    fn wait_visible(&mut self, selector: &str, timeout_ms: Option<u64>) -> &mut Self {
        self.push(TestStep::Wait {
            selector: selector.to_string(),
            timeout_ms,
            state: WaitState::Visible,
        })
    }

    fn assert_step(selector: &str) -> TestStep {
        TestStep::Assert {
            selector: selector.to_string(),
            filter_text: None,
            visible: None,
            disabled: None,
            text: None,
            text_contains: None,
            attribute: None,
            timeout_ms: None,
        }
    }

    fn assert_attribute(&mut self, selector: &str, name: &str, value: &str) -> &mut Self {
        let mut step = Self::assert_step(selector);
        if let TestStep::Assert { attribute, .. } = &mut step {
            *attribute = Some(AttributeAssertion {
                name: name.to_string(),
                value: Some(value.to_string()),
                contains: None,
            });
        }
        self.push(step)
    }

    // Navigation and session

    /// Open a path relative to the base URL
    pub fn visit(&mut self, path: &str) -> &mut Self {
        self.push(TestStep::Navigate {
            url: path.to_string(),
            wait_for_selector: None,
        })
    }

    pub fn clear_local_storage(&mut self) -> &mut Self {
        self.push(TestStep::ClearLocalStorage)
    }

    pub fn log(&mut self, message: &str) -> &mut Self {
        self.push(TestStep::Log {
            message: message.to_string(),
        })
    }

    pub fn ignore_uncaught_exceptions(&mut self, reason: &str) -> &mut Self {
        self.push(TestStep::IgnoreUncaughtExceptions {
            reason: reason.to_string(),
        })
    }

    /// Start observing the registration POST
    pub fn intercept_register(&mut self) -> &mut Self {
        let url = self.register_endpoint.clone();
        self.push(TestStep::Intercept {
            alias: REGISTER_ALIAS.to_string(),
            method: "POST".to_string(),
            url,
        })
    }

    /// Await the intercepted registration POST and check it
    pub fn wait_for_register(&mut self, expect: ResponseExpectation) -> &mut Self {
        let timeout_ms = Some(self.network_timeout_ms);
        self.push(TestStep::WaitForResponse {
            alias: REGISTER_ALIAS.to_string(),
            timeout_ms,
            expect,
        })
    }

    // Actions

    pub fn click_register_button(&mut self) -> &mut Self {
        self.click(locators::REGISTER_BUTTON)
    }

    pub fn click_continue_button(&mut self) -> &mut Self {
        self.click(locators::CONTINUE_BUTTON)
    }

    pub fn enter_email(&mut self, email: &str) -> &mut Self {
        self.replace_text(locators::EMAIL, email)
    }

    pub fn clear_email_field(&mut self) -> &mut Self {
        self.push(TestStep::Clear {
            selector: locators::EMAIL.to_string(),
        })
    }

    pub fn enter_password(&mut self, password: &str) -> &mut Self {
        self.replace_text(locators::PASSWORD, password)
    }

    /// Open the country dropdown and pick `country` by typing it
    pub fn select_country(&mut self, country: &str) -> &mut Self {
        self.wait_visible(locators::COUNTRY_SELECTOR, None)
            .click(locators::COUNTRY_SELECTOR)
            .push(TestStep::Type {
                selector: locators::COUNTRY_SELECTOR.to_string(),
                text: country.to_string(),
                clear_first: false,
                submit: true,
            })
    }

    pub fn enter_city(&mut self, city: &str) -> &mut Self {
        self.replace_text(locators::CITY, city)
    }

    pub fn enter_street(&mut self, street: &str) -> &mut Self {
        self.replace_text(locators::STREET, street)
    }

    pub fn enter_postcode(&mut self, postcode: &str) -> &mut Self {
        self.replace_text(locators::POSTCODE, postcode)
    }

    pub fn enter_first_name(&mut self, first_name: &str) -> &mut Self {
        self.replace_text(locators::FIRST_NAME, first_name)
    }

    pub fn enter_last_name(&mut self, last_name: &str) -> &mut Self {
        self.replace_text(locators::LAST_NAME, last_name)
    }

    pub fn enter_date_of_birth(&mut self, date_of_birth: &str) -> &mut Self {
        self.replace_text(locators::DATE_OF_BIRTH, date_of_birth)
    }

    pub fn click_terms_toggle(&mut self) -> &mut Self {
        self.click(locators::TERMS_TOGGLE)
    }

    pub fn enable_then_disable_terms(&mut self) -> &mut Self {
        self.click(locators::TERMS_TOGGLE).click(locators::TERMS_TOGGLE)
    }

    pub fn click_toggle_password(&mut self) -> &mut Self {
        self.click(locators::TOGGLE_PASSWORD)
    }

    pub fn click_go_back_button(&mut self) -> &mut Self {
        self.click(locators::GO_BACK)
    }

    pub fn click_need_help_button(&mut self) -> &mut Self {
        self.wait_visible(locators::NEED_HELP, None)
            .click(locators::NEED_HELP)
    }

    // Queries

    pub fn verify_continue_disabled(&mut self) -> &mut Self {
        let mut step = Self::assert_step(locators::CONTINUE_BUTTON);
        if let TestStep::Assert { disabled, .. } = &mut step {
            *disabled = Some(true);
        }
        self.push(step)
    }

    /// A validation message containing `text` is visible
    pub fn verify_error_displayed(&mut self, text: &str) -> &mut Self {
        let mut step = Self::assert_step(locators::ERROR_MESSAGES);
        if let TestStep::Assert { filter_text, visible, .. } = &mut step {
            *filter_text = Some(text.to_string());
            *visible = Some(true);
        }
        self.push(step)
    }

    pub fn verify_email_in_use_error(&mut self) -> &mut Self {
        let mut step = Self::assert_step(locators::EMAIL_IN_USE_ERROR);
        if let TestStep::Assert { text, visible, .. } = &mut step {
            *text = Some(messages::EMAIL_IN_USE.to_string());
            *visible = Some(true);
        }
        self.push(step)
    }

    pub fn verify_password_hidden(&mut self) -> &mut Self {
        self.assert_attribute(locators::PASSWORD, "type", "password")
    }

    pub fn verify_password_visible(&mut self) -> &mut Self {
        self.assert_attribute(locators::PASSWORD, "type", "text")
    }

    pub fn verify_headline(&mut self, expected: &str) -> &mut Self {
        let mut step = Self::assert_step(locators::HEADLINE);
        if let TestStep::Assert { text_contains, .. } = &mut step {
            *text_contains = Some(expected.to_string());
        }
        self.push(step)
    }

    pub fn verify_help_widget_visible(&mut self) -> &mut Self {
        let mut step = Self::assert_step(locators::HELP_WIDGET);
        if let TestStep::Assert { visible, timeout_ms, .. } = &mut step {
            *visible = Some(true);
            *timeout_ms = Some(self.widget_timeout_ms);
        }
        self.push(step)
    }
}
