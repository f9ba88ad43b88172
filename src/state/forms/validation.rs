//! Field categories and their validators
//!
//! Every validator is a pure function from the raw input to an error
//! message. An empty message means the value conforms to its category.
//! Empty input is never a format error: required-ness is checked
//! separately by [`check`].

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static ALPHABET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").unwrap());
static PAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap()
});
static AADHAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{12}$").unwrap());
static PINCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap());
static PASSPORT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][0-9]{7}$").unwrap());
static DRIVING_LICENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[ -]?[0-9]{11}$").unwrap());
static VOTER_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}[0-9]{7}$").unwrap());
static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{0,11}$").unwrap());

/// Characters rejected in free-text inputs
const FORBIDDEN_TEXT_CHARS: &[char] = &['<', '>', '{', '}', '$', ';', '`'];

const TEXT_AREA_MAX_CHARS: usize = 250;
const TEXT_FIELD_MAX_CHARS: usize = 100;

/// Default minimum applicant age in years
pub const DEFAULT_MIN_AGE_YEARS: u32 = 18;

/// Named validation policy applied to one or more fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    /// Names, city, state
    Alphabet,
    Pan,
    Email,
    /// Date of birth in `YYYY-MM-DD`
    Dob,
    Aadhar,
    Pincode,
    /// Multi-line address text
    TextArea,
    /// Generic single-line text
    TextField,
    Passport,
    DrivingLicence,
    VoterId,
    Mobile,
    Amount,
}

/// Calendar inputs for date rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub today: NaiveDate,
    pub min_age_years: Option<u32>,
}

impl ValidationPolicy {
    pub fn new(today: NaiveDate, min_age_years: Option<u32>) -> Self {
        Self {
            today,
            min_age_years,
        }
    }

    /// Policy anchored at the local calendar date
    pub fn current(min_age_years: Option<u32>) -> Self {
        Self::new(Local::now().date_naive(), min_age_years)
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::current(Some(DEFAULT_MIN_AGE_YEARS))
    }
}

type Rule = fn(&str, &ValidationPolicy) -> Option<String>;

impl FieldCategory {
    pub const ALL: [FieldCategory; 13] = [
        FieldCategory::Alphabet,
        FieldCategory::Pan,
        FieldCategory::Email,
        FieldCategory::Dob,
        FieldCategory::Aadhar,
        FieldCategory::Pincode,
        FieldCategory::TextArea,
        FieldCategory::TextField,
        FieldCategory::Passport,
        FieldCategory::DrivingLicence,
        FieldCategory::VoterId,
        FieldCategory::Mobile,
        FieldCategory::Amount,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Alphabet => "Alphabet",
            Self::Pan => "PAN",
            Self::Email => "Email",
            Self::Dob => "Date of Birth",
            Self::Aadhar => "Aadhar",
            Self::Pincode => "Pincode",
            Self::TextArea => "Address",
            Self::TextField => "Text",
            Self::Passport => "Passport",
            Self::DrivingLicence => "Driving Licence",
            Self::VoterId => "Voter ID",
            Self::Mobile => "Mobile",
            Self::Amount => "Amount",
        }
    }

    fn rule(self) -> Rule {
        match self {
            Self::Alphabet => alphabet,
            Self::Pan => pan,
            Self::Email => email,
            Self::Dob => dob,
            Self::Aadhar => aadhar,
            Self::Pincode => pincode,
            Self::TextArea => text_area,
            Self::TextField => text_field,
            Self::Passport => passport,
            Self::DrivingLicence => driving_licence,
            Self::VoterId => voter_id,
            Self::Mobile => mobile,
            Self::Amount => amount,
        }
    }
}

/// Validate against the current calendar date and the default age policy
pub fn validate(raw_value: &str, category: FieldCategory) -> String {
    validate_with(raw_value, category, &ValidationPolicy::default())
}

/// Validate with an explicit policy. Returns an empty string when valid.
pub fn validate_with(raw_value: &str, category: FieldCategory, policy: &ValidationPolicy) -> String {
    let value = raw_value.trim();
    if value.is_empty() {
        return String::new();
    }
    (category.rule())(value, policy).unwrap_or_default()
}

/// Field-level failure shown inline under the input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0}")]
    Format(String),
    #[error("{0}")]
    RequiredFieldMissing(String),
    /// Value is valid but still needs OTP verification
    #[error("{0}")]
    Unverified(String),
}

impl FieldError {
    pub fn message(&self) -> &str {
        match self {
            Self::Format(m) | Self::RequiredFieldMissing(m) | Self::Unverified(m) => m,
        }
    }
}

/// Required check followed by the category check
pub fn check(
    raw_value: &str,
    required_message: Option<&str>,
    category: Option<FieldCategory>,
    policy: &ValidationPolicy,
) -> Result<(), FieldError> {
    if raw_value.trim().is_empty() {
        return match required_message {
            Some(message) => Err(FieldError::RequiredFieldMissing(message.to_string())),
            None => Ok(()),
        };
    }
    if let Some(category) = category {
        let message = validate_with(raw_value, category, policy);
        if !message.is_empty() {
            return Err(FieldError::Format(message));
        }
    }
    Ok(())
}

fn matches(re: &Regex, value: &str, message: &str) -> Option<String> {
    if re.is_match(value) {
        None
    } else {
        Some(message.to_string())
    }
}

fn alphabet(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&ALPHABET_RE, value, "Only alphabets and spaces are allowed")
}

fn pan(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&PAN_RE, value, "Invalid PAN format (e.g. ABCDE1234F)")
}

fn email(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&EMAIL_RE, value, "Please enter a valid email address")
}

fn dob(value: &str, policy: &ValidationPolicy) -> Option<String> {
    let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
        return Some("Date must be in YYYY-MM-DD format".to_string());
    };
    if date > policy.today {
        return Some("Date of birth cannot be in the future".to_string());
    }
    if let Some(min_age) = policy.min_age_years {
        if age_on(date, policy.today) < min_age {
            return Some(format!("Applicant must be at least {min_age} years old"));
        }
    }
    None
}

/// Completed years between `born` and `today`
fn age_on(born: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

fn aadhar(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&AADHAR_RE, value, "Aadhar number must be exactly 12 digits")
}

fn pincode(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&PINCODE_RE, value, "Pincode must be a valid 6 digit number")
}

fn free_text(value: &str, max_chars: usize) -> Option<String> {
    if value.contains(FORBIDDEN_TEXT_CHARS) {
        return Some("Special characters like < > { } $ ; ` are not allowed".to_string());
    }
    if value.chars().count() > max_chars {
        return Some(format!("Maximum {max_chars} characters allowed"));
    }
    None
}

fn text_area(value: &str, _: &ValidationPolicy) -> Option<String> {
    free_text(value, TEXT_AREA_MAX_CHARS)
}

fn text_field(value: &str, _: &ValidationPolicy) -> Option<String> {
    free_text(value, TEXT_FIELD_MAX_CHARS)
}

fn passport(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&PASSPORT_RE, value, "Invalid passport number (e.g. A1234567)")
}

fn driving_licence(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(
        &DRIVING_LICENCE_RE,
        value,
        "Invalid driving licence number (e.g. MH0420110012345)",
    )
}

fn voter_id(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&VOTER_ID_RE, value, "Invalid Voter ID (e.g. ABC1234567)")
}

fn mobile(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&MOBILE_RE, value, "Please enter a valid 10 digit mobile number")
}

fn amount(value: &str, _: &ValidationPolicy) -> Option<String> {
    matches(&AMOUNT_RE, value, "Please enter a valid amount")
}
