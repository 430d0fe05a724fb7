//! Validation rules enforced by the registration form
//!
//! These mirror what the UI enforces so scenarios can pick inputs on either
//! side of each rule, and so generated fixtures can be checked against them.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Minimum length for city, street, postcode and name fields
pub const MIN_TEXT_LEN: usize = 3;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum age to register
pub const MIN_AGE_YEARS: i32 = 18;

/// Date format typed into the date-of-birth field
pub const DOB_INPUT_FORMAT: &str = "%d/%m/%Y";

/// Inline error texts shown under the fields
pub mod messages {
    pub const INVALID_EMAIL: &str = "Invalid email address";
    pub const EMAIL_REQUIRED: &str = "E-mail is required";
    pub const CITY_TOO_SHORT: &str = "City is too short";
    pub const STREET_TOO_SHORT: &str = "Address is too short";
    pub const POSTCODE_TOO_SHORT: &str = "Post code is too short";
    pub const FIRST_NAME_TOO_SHORT: &str = "First Name is too short";
    pub const LAST_NAME_TOO_SHORT: &str = "Last Name is too short";
    pub const INVALID_DOB: &str = "Invalid date of birth";
    pub const UNDERAGE: &str = "You must be 18 years old.";
    pub const TERMS_REQUIRED: &str = "Terms & Conditions is required";
    pub const EMAIL_IN_USE: &str = "Email is already in use.";
}

/// Free-text fields that share the minimum-length rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    City,
    Street,
    Postcode,
    FirstName,
    LastName,
}

impl TextField {
    /// Message shown when the field is shorter than [`MIN_TEXT_LEN`]
    pub fn too_short_message(self) -> &'static str {
        match self {
            TextField::City => messages::CITY_TOO_SHORT,
            TextField::Street => messages::STREET_TOO_SHORT,
            TextField::Postcode => messages::POSTCODE_TOO_SHORT,
            TextField::FirstName => messages::FIRST_NAME_TOO_SHORT,
            TextField::LastName => messages::LAST_NAME_TOO_SHORT,
        }
    }

    pub fn accepts(self, value: &str) -> bool {
        value.chars().count() >= MIN_TEXT_LEN
    }
}

/// Password policy: length, digit, uppercase and lowercase
pub fn password_meets_policy(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
}

/// Loose email syntax check: one `@`, non-empty local part, dotted domain
pub fn email_is_valid(email: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is a valid regex")
        })
        .is_match(email)
}

/// Outcome of checking a typed date of birth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DobCheck {
    Valid,
    Invalid,
    Underage,
}

impl DobCheck {
    pub fn message(self) -> Option<&'static str> {
        match self {
            DobCheck::Valid => None,
            DobCheck::Invalid => Some(messages::INVALID_DOB),
            DobCheck::Underage => Some(messages::UNDERAGE),
        }
    }
}

/// Check a `DD/MM/YYYY` date of birth as of `today`
pub fn check_date_of_birth(input: &str, today: NaiveDate) -> DobCheck {
    match NaiveDate::parse_from_str(input, DOB_INPUT_FORMAT) {
        Ok(dob) if dob > today => DobCheck::Invalid,
        Ok(dob) if age_on(dob, today) < MIN_AGE_YEARS => DobCheck::Underage,
        Ok(_) => DobCheck::Valid,
        Err(_) => DobCheck::Invalid,
    }
}

/// Full years elapsed between `dob` and `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}
