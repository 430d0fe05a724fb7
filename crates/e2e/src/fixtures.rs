//! Randomized test data for registration scenarios

use chrono::{Local, Months, NaiveDate};
use fake::faker::internet::en::Password;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rules::{self, TextField, DOB_INPUT_FORMAT};

/// Domain used for every generated address
pub const EMAIL_DOMAIN: &str = "test.com";

/// Digit appended to every generated password
const PASSWORD_SUFFIX: char = '3';

/// A fresh, unregistered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl GeneratedUser {
    pub fn random() -> Self {
        Self::random_with_rng(&mut rand::thread_rng())
    }

    pub fn random_with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            email: generate_email_with_rng(rng),
            first_name: generate_first_name_with_rng(rng),
            last_name: generate_last_name_with_rng(rng),
            password: generate_password_with_rng(rng),
        }
    }
}

/// Address and personal details shared by the registration scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDetails {
    pub country: String,
    pub country_code: String,
    pub city: String,
    pub street: String,
    pub postcode: String,
    /// As typed into the form (`DD/MM/YYYY`)
    pub date_of_birth: String,
    /// As echoed by the API (`YYYY-MM-DD`)
    pub date_of_birth_iso: String,
}

impl Default for RegistrationDetails {
    fn default() -> Self {
        Self {
            country: "Malta".to_string(),
            country_code: "MT".to_string(),
            city: "Valetta".to_string(),
            street: "Malta address".to_string(),
            postcode: "postcode".to_string(),
            date_of_birth: "09/09/1999".to_string(),
            date_of_birth_iso: "1999-09-09".to_string(),
        }
    }
}

/// `first_last_NNNN@test.com`, lower-cased
pub fn generate_email() -> String {
    generate_email_with_rng(&mut rand::thread_rng())
}

pub fn generate_email_with_rng<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = email_safe(&FirstName().fake_with_rng::<String, _>(rng));
    let last = email_safe(&LastName().fake_with_rng::<String, _>(rng));
    let suffix: u32 = rng.gen_range(0..10000);
    format!("{first}_{last}_{suffix}@{EMAIL_DOMAIN}")
}

/// Random password that always satisfies the password policy
pub fn generate_password() -> String {
    generate_password_with_rng(&mut rand::thread_rng())
}

pub fn generate_password_with_rng<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut password: String = Password(8..16).fake_with_rng(rng);
    password.push(PASSWORD_SUFFIX);

    // The fake base may lack a letter case; top it up rather than reroll.
    if !password.chars().any(char::is_uppercase) {
        password.push(rng.gen_range(b'A'..=b'Z') as char);
    }
    if !password.chars().any(char::is_lowercase) {
        password.push(rng.gen_range(b'a'..=b'z') as char);
    }

    debug_assert!(rules::password_meets_policy(&password));
    password
}

pub fn generate_first_name() -> String {
    generate_first_name_with_rng(&mut rand::thread_rng())
}

pub fn generate_first_name_with_rng<R: Rng + ?Sized>(rng: &mut R) -> String {
    loop {
        let name: String = FirstName().fake_with_rng(rng);
        if TextField::FirstName.accepts(&name) {
            return name;
        }
    }
}

pub fn generate_last_name() -> String {
    generate_last_name_with_rng(&mut rand::thread_rng())
}

pub fn generate_last_name_with_rng<R: Rng + ?Sized>(rng: &mut R) -> String {
    loop {
        let name: String = LastName().fake_with_rng(rng);
        if TextField::LastName.accepts(&name) {
            return name;
        }
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A date of birth making the user `years` old as of `today`, as typed into the form
pub fn date_of_birth_for_age(years: u32, today: NaiveDate) -> String {
    today
        .checked_sub_months(Months::new(years * 12))
        .unwrap_or(today)
        .format(DOB_INPUT_FORMAT)
        .to_string()
}

/// A date of birth that is comfortably under the minimum age
pub fn underage_date_of_birth(today: NaiveDate) -> String {
    date_of_birth_for_age(16, today)
}

/// A date of birth that is comfortably over the minimum age
pub fn adult_date_of_birth(today: NaiveDate) -> String {
    date_of_birth_for_age(26, today)
}

fn email_safe(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}
