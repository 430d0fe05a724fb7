//! Registration-flow scenarios
//!
//! Each constructor generates its own fixtures, so calling it twice yields two
//! independent runs.

use chrono::NaiveDate;

use crate::api::{ResponseExpectation, RESULT_EMAIL_IN_USE, RESULT_SUCCESS};
use crate::config::E2eConfig;
use crate::fixtures::{self, GeneratedUser, RegistrationDetails};
use crate::page::RegistrationPage;
use crate::rules::{messages, TextField};
use crate::spec::TestSpec;

pub const REGISTER_NEW_USER: &str = "should-register-new-user";
pub const REJECT_EXISTING_EMAIL: &str = "should-not-register-with-existing-email";
pub const UI_VALIDATION_ERRORS: &str = "should-check-ui-validation-errors";
pub const BUTTONS_FUNCTIONAL: &str = "should-check-buttons-are-functional";

/// Headline on the first step of the form
const CREDENTIALS_HEADLINE: &str = "Hello Friend";

/// All scenarios in execution order
pub fn all(config: &E2eConfig) -> Vec<TestSpec> {
    all_as_of(config, fixtures::today())
}

/// All scenarios, with age-dependent inputs computed relative to `today`
pub fn all_as_of(config: &E2eConfig, today: NaiveDate) -> Vec<TestSpec> {
    vec![
        register_new_user(config, &GeneratedUser::random()),
        reject_existing_email(config, &GeneratedUser::random()),
        ui_validation_errors(config, today),
        buttons_functional(config, &fixtures::generate_password()),
    ]
}

/// Walk all four steps of the form and submit, intercepting the POST
fn fill_registration(page: &mut RegistrationPage, user: &GeneratedUser, details: &RegistrationDetails) {
    page.enter_email(&user.email)
        .enter_password(&user.password)
        .click_continue_button();

    page.select_country(&details.country)
        .enter_city(&details.city)
        .enter_street(&details.street)
        .enter_postcode(&details.postcode)
        .click_continue_button();

    page.enter_first_name(&user.first_name)
        .enter_last_name(&user.last_name)
        .enter_date_of_birth(&details.date_of_birth)
        .click_continue_button();

    page.click_terms_toggle()
        .intercept_register()
        .click_continue_button();
}

/// A fresh user registers and the API echoes the submitted details
pub fn register_new_user(config: &E2eConfig, user: &GeneratedUser) -> TestSpec {
    let details = RegistrationDetails::default();
    let mut page = RegistrationPage::new(config);

    page.visit("/").click_register_button();
    fill_registration(&mut page, user, &details);
    page.wait_for_register(
        ResponseExpectation::status(200)
            .contains("result", RESULT_SUCCESS)
            .contains("user.email", &user.email)
            .contains("user.firstName", &user.first_name)
            .contains("user.lastName", &user.last_name)
            .contains("user.countryCode", &details.country_code)
            .contains("user.city", &details.city)
            .contains("user.street", &details.street)
            .contains("user.postCode", &details.postcode)
            .contains("user.dateOfBirth", &details.date_of_birth_iso),
    );

    TestSpec {
        name: REGISTER_NEW_USER.to_string(),
        description: "should register new user".to_string(),
        tags: vec!["registration".to_string(), "smoke".to_string()],
        viewport: None,
        steps: page.into_steps(),
    }
}

/// Registering twice with one email is rejected the second time
pub fn reject_existing_email(config: &E2eConfig, user: &GeneratedUser) -> TestSpec {
    let details = RegistrationDetails::default();
    let mut page = RegistrationPage::new(config);

    page.visit("/").click_register_button();
    fill_registration(&mut page, user, &details);
    page.wait_for_register(ResponseExpectation::status(200));

    // Autofill from the first attempt would otherwise pre-populate the form.
    page.clear_local_storage().visit("/register");
    fill_registration(&mut page, user, &details);
    page.wait_for_register(ResponseExpectation::status(400).contains("result", RESULT_EMAIL_IN_USE))
        .verify_email_in_use_error();

    TestSpec {
        name: REJECT_EXISTING_EMAIL.to_string(),
        description: "should not register with the existing email address".to_string(),
        tags: vec!["registration".to_string()],
        viewport: None,
        steps: page.into_steps(),
    }
}

/// Inline validation on every step of the form
pub fn ui_validation_errors(config: &E2eConfig, today: NaiveDate) -> TestSpec {
    let mut page = RegistrationPage::new(config);
    let adult_dob = fixtures::adult_date_of_birth(today);

    page.visit("/register");

    page.log("email address cannot be invalid")
        .verify_continue_disabled()
        .enter_email("test.test.com")
        .verify_error_displayed(messages::INVALID_EMAIL)
        .verify_continue_disabled();

    page.log("email address cannot be empty")
        .clear_email_field()
        .verify_error_displayed(messages::EMAIL_REQUIRED);

    page.log("password needs 8 characters with a digit, an uppercase and a lowercase letter")
        .enter_email("test@test.com")
        .verify_continue_disabled();
    for weak in ["aA", "aA12"] {
        page.enter_password(weak).verify_continue_disabled();
    }
    page.enter_password("aA123456").click_continue_button();

    page.log("city cannot have less than 3 characters")
        .enter_city("te")
        .enter_street("test")
        .enter_postcode("test")
        .verify_continue_disabled()
        .verify_error_displayed(TextField::City.too_short_message());

    page.log("street cannot have less than 3 characters")
        .enter_city("test")
        .enter_street("te")
        .verify_continue_disabled()
        .verify_error_displayed(TextField::Street.too_short_message());

    page.log("post code cannot have less than 3 characters")
        .enter_street("test")
        .enter_postcode("te")
        .verify_continue_disabled()
        .verify_error_displayed(TextField::Postcode.too_short_message());

    page.enter_postcode("test")
        .click_continue_button()
        .verify_continue_disabled();

    page.log("first name cannot have less than 3 characters")
        .enter_first_name("te")
        .enter_last_name("test")
        .enter_date_of_birth(&adult_dob)
        .verify_continue_disabled()
        .verify_error_displayed(TextField::FirstName.too_short_message());

    page.log("last name cannot have less than 3 characters")
        .enter_first_name("test")
        .enter_last_name("te")
        .verify_continue_disabled()
        .verify_error_displayed(TextField::LastName.too_short_message())
        .enter_last_name("test");

    page.log("date of birth cannot be less than 18 years ago")
        .enter_date_of_birth(&fixtures::underage_date_of_birth(today))
        .verify_continue_disabled()
        .verify_error_displayed(messages::UNDERAGE);

    page.log("date of birth cannot be invalid")
        .enter_date_of_birth("22/22/2010")
        .verify_error_displayed(messages::INVALID_DOB)
        .verify_continue_disabled();

    page.enter_date_of_birth(&adult_dob).click_continue_button();

    page.log("terms and conditions must be accepted")
        .verify_continue_disabled()
        .enable_then_disable_terms()
        .verify_continue_disabled()
        .verify_error_displayed(messages::TERMS_REQUIRED);

    TestSpec {
        name: UI_VALIDATION_ERRORS.to_string(),
        description: "should check UI validation errors".to_string(),
        tags: vec!["validation".to_string()],
        viewport: None,
        steps: page.into_steps(),
    }
}

/// Password toggle, back navigation and the help widget
pub fn buttons_functional(config: &E2eConfig, password: &str) -> TestSpec {
    let mut page = RegistrationPage::new(config);

    page.visit("/register")
        .enter_email("test@test.com")
        .enter_password(password)
        .verify_password_hidden()
        .click_toggle_password()
        .verify_password_visible()
        .click_continue_button()
        .click_go_back_button()
        .verify_headline(CREDENTIALS_HEADLINE)
        .click_continue_button();

    // The help widget's own backend request 404s and throws in the page.
    page.ignore_uncaught_exceptions("help widget request fails outside our control")
        .click_need_help_button()
        .verify_help_widget_visible();

    TestSpec {
        name: BUTTONS_FUNCTIONAL.to_string(),
        description: "should check buttons are functional".to_string(),
        tags: vec!["ui".to_string()],
        viewport: None,
        steps: page.into_steps(),
    }
}
