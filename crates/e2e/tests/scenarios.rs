//! Scenario composition tests
//!
//! These check what each scenario will do in the browser without launching one.

use chrono::NaiveDate;
use test_case::test_case;

use pixelbet_e2e::api::{ResponseExpectation, RESULT_EMAIL_IN_USE, RESULT_SUCCESS};
use pixelbet_e2e::fixtures::GeneratedUser;
use pixelbet_e2e::page::locators;
use pixelbet_e2e::rules::{self, messages};
use pixelbet_e2e::scenarios;
use pixelbet_e2e::{E2eConfig, TestStep};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn jane() -> GeneratedUser {
    GeneratedUser {
        email: "jane_doe_4821@test.com".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        password: "Secretpass3".to_string(),
    }
}

fn expectations(steps: &[TestStep]) -> Vec<&ResponseExpectation> {
    steps
        .iter()
        .filter_map(|s| match s {
            TestStep::WaitForResponse { expect, .. } => Some(expect),
            _ => None,
        })
        .collect()
}

fn typed_into<'a>(steps: &'a [TestStep], selector: &str) -> Vec<&'a str> {
    steps
        .iter()
        .filter_map(|s| match s {
            TestStep::Type { selector: sel, text, .. } if sel == selector => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn register_new_user_expects_echoed_details() {
    let spec = scenarios::register_new_user(&E2eConfig::default(), &jane());
    let expected = expectations(&spec.steps);
    assert_eq!(expected.len(), 1);

    let expect = expected[0];
    assert_eq!(expect.status, Some(200));
    let fields: Vec<(&str, &str)> = expect
        .body_contains
        .iter()
        .map(|f| (f.path.as_str(), f.contains.as_str()))
        .collect();
    assert!(fields.contains(&("result", RESULT_SUCCESS)));
    assert!(fields.contains(&("user.email", "jane_doe_4821@test.com")));
    assert!(fields.contains(&("user.countryCode", "MT")));
    assert!(fields.contains(&("user.city", "Valetta")));
    assert!(fields.contains(&("user.street", "Malta address")));
    assert!(fields.contains(&("user.postCode", "postcode")));
    assert!(fields.contains(&("user.dateOfBirth", "1999-09-09")));
}

#[test]
fn register_new_user_intercepts_before_submitting() {
    let spec = scenarios::register_new_user(&E2eConfig::default(), &jane());
    let intercept = spec
        .steps
        .iter()
        .position(|s| matches!(s, TestStep::Intercept { .. }))
        .unwrap();

    // The very next step is the submitting click
    assert!(matches!(
        &spec.steps[intercept + 1],
        TestStep::Click { selector, .. } if selector == locators::CONTINUE_BUTTON
    ));
    assert!(matches!(&spec.steps[intercept - 1], TestStep::Click { selector, .. } if selector == locators::TERMS_TOGGLE));
    assert_eq!(typed_into(&spec.steps, locators::DATE_OF_BIRTH), vec!["09/09/1999"]);
}

#[test]
fn duplicate_registration_reuses_email_and_clears_storage() {
    let user = jane();
    let spec = scenarios::reject_existing_email(&E2eConfig::default(), &user);

    assert_eq!(typed_into(&spec.steps, locators::EMAIL), vec![user.email.as_str(), user.email.as_str()]);

    let expected = expectations(&spec.steps);
    assert_eq!(expected.len(), 2);
    assert_eq!(expected[0].status, Some(200));
    assert_eq!(expected[1].status, Some(400));
    assert_eq!(expected[1].body_contains[0].contains, RESULT_EMAIL_IN_USE);

    let first_wait = spec
        .steps
        .iter()
        .position(|s| matches!(s, TestStep::WaitForResponse { .. }))
        .unwrap();
    assert_eq!(spec.steps[first_wait + 1], TestStep::ClearLocalStorage);
    assert!(matches!(&spec.steps[first_wait + 2], TestStep::Navigate { url, .. } if url == "/register"));

    assert!(matches!(
        spec.steps.last().unwrap(),
        TestStep::Assert { selector, text: Some(text), .. }
            if selector == locators::EMAIL_IN_USE_ERROR && text == messages::EMAIL_IN_USE
    ));
}

#[test_case(messages::INVALID_EMAIL)]
#[test_case(messages::EMAIL_REQUIRED)]
#[test_case(messages::CITY_TOO_SHORT)]
#[test_case(messages::STREET_TOO_SHORT)]
#[test_case(messages::POSTCODE_TOO_SHORT)]
#[test_case(messages::FIRST_NAME_TOO_SHORT)]
#[test_case(messages::LAST_NAME_TOO_SHORT)]
#[test_case(messages::UNDERAGE)]
#[test_case(messages::INVALID_DOB)]
#[test_case(messages::TERMS_REQUIRED)]
fn validation_scenario_checks_message(message: &str) {
    let spec = scenarios::ui_validation_errors(&E2eConfig::default(), today());
    let found = spec.steps.iter().any(|s| matches!(
        s,
        TestStep::Assert { selector, filter_text: Some(text), visible: Some(true), .. }
            if selector == locators::ERROR_MESSAGES && text == message
    ));
    assert!(found, "no check for {message:?}");
}

#[test]
fn validation_scenario_password_ladder() {
    let spec = scenarios::ui_validation_errors(&E2eConfig::default(), today());
    let passwords = typed_into(&spec.steps, locators::PASSWORD);
    assert_eq!(passwords, vec!["aA", "aA12", "aA123456"]);

    let (accepted, rejected) = passwords.split_last().unwrap();
    assert!(rules::password_meets_policy(accepted));
    assert!(rejected.iter().all(|p| !rules::password_meets_policy(p)));
}

#[test]
fn validation_scenario_dates_hit_each_rule() {
    let spec = scenarios::ui_validation_errors(&E2eConfig::default(), today());
    let checks: Vec<_> = typed_into(&spec.steps, locators::DATE_OF_BIRTH)
        .into_iter()
        .map(|dob| rules::check_date_of_birth(dob, today()))
        .collect();
    assert!(checks.contains(&rules::DobCheck::Valid));
    assert!(checks.contains(&rules::DobCheck::Underage));
    assert!(checks.contains(&rules::DobCheck::Invalid));
}

#[test]
fn buttons_scenario_checks_toggle_and_headline() {
    let spec = scenarios::buttons_functional(&E2eConfig::default(), "Secretpass3");
    let names: Vec<String> = spec.steps.iter().map(TestStep::name).collect();

    let hidden = names.iter().position(|n| n == "assert:#password").unwrap();
    let toggle = names
        .iter()
        .position(|n| n == &format!("click:{}", locators::TOGGLE_PASSWORD))
        .unwrap();
    assert!(hidden < toggle);
    assert!(spec.steps.iter().any(|s| matches!(
        s,
        TestStep::Assert { text_contains: Some(t), .. } if t == "Hello Friend"
    )));
}

#[test]
fn every_scenario_round_trips_through_yaml() {
    for spec in scenarios::all_as_of(&E2eConfig::default(), today()) {
        let yaml = spec.to_yaml().unwrap();
        let parsed = pixelbet_e2e::TestSpec::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.steps, spec.steps, "{} changed through YAML", spec.name);
    }
}
