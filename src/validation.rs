//! Field format checks shared by the wizard and the command layer.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::config::BookingConfig;
use crate::models::PatientInfo;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").unwrap());

/// Form field a validation failure is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Service,
    Doctor,
    Date,
    Time,
    Name,
    Email,
    Phone,
    Dob,
    Terms,
    Rating,
}

/// A user-correctable input problem. `Display` is the banner text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", required_message(.0))]
    Required(Field),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Doctor {doctor} does not practice in {service}")]
    DoctorNotInService { doctor: String, service: String },

    #[error("Please choose a date between {earliest} and {latest}.")]
    DateOutOfRange {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Appointments are not available on {}.", weekday_name(.0))]
    ClosedOnWeekday(Weekday),

    #[error("The {0} slot is not available. Please pick another time.")]
    SlotUnavailable(String),

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Please enter a valid phone number.")]
    InvalidPhone,

    #[error("Please enter a valid date of birth.")]
    InvalidDob,

    #[error("Please accept the terms and conditions.")]
    TermsNotAccepted,

    #[error("Ratings run from 1 to 5.")]
    InvalidRating(u8),
}

fn required_message(field: &Field) -> &'static str {
    match field {
        Field::Service => "Please select a service.",
        Field::Doctor => "Please select a doctor.",
        Field::Date => "Please select an appointment date.",
        Field::Time => "Please select an appointment time.",
        _ => "This field is required.",
    }
}

fn weekday_name(day: &Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mondays",
        Weekday::Tue => "Tuesdays",
        Weekday::Wed => "Wednesdays",
        Weekday::Thu => "Thursdays",
        Weekday::Fri => "Fridays",
        Weekday::Sat => "Saturdays",
        Weekday::Sun => "Sundays",
    }
}

impl ValidationError {
    /// The field to highlight inline.
    pub fn field(&self) -> Field {
        match self {
            Self::Required(f) => *f,
            Self::UnknownService(_) => Field::Service,
            Self::DoctorNotInService { .. } => Field::Doctor,
            Self::DateOutOfRange { .. } | Self::ClosedOnWeekday(_) => Field::Date,
            Self::SlotUnavailable(_) => Field::Time,
            Self::InvalidEmail => Field::Email,
            Self::InvalidPhone => Field::Phone,
            Self::InvalidDob => Field::Dob,
            Self::TermsNotAccepted => Field::Terms,
            Self::InvalidRating(_) => Field::Rating,
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Accepts only the display form `(XXX) XXX-XXXX`.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Normalize a 10-digit number to `(XXX) XXX-XXXX`; other input is
/// returned unchanged.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
    } else {
        raw.to_string()
    }
}

/// First and last bookable dates relative to `today`.
pub fn booking_window(today: NaiveDate, config: &BookingConfig) -> (NaiveDate, NaiveDate) {
    (
        today + Duration::days(config.min_booking_days),
        today + Duration::days(config.max_booking_days),
    )
}

/// Date must fall inside the booking window and on a working day.
pub fn validate_appointment_date(
    date: NaiveDate,
    today: NaiveDate,
    config: &BookingConfig,
) -> Result<(), ValidationError> {
    let (earliest, latest) = booking_window(today, config);
    if date < earliest || date > latest {
        return Err(ValidationError::DateOutOfRange {
            date,
            earliest,
            latest,
        });
    }
    if !config.working_days.contains(&date.weekday()) {
        return Err(ValidationError::ClosedOnWeekday(date.weekday()));
    }
    Ok(())
}

/// Date of birth: `YYYY-MM-DD`, not after today.
pub fn validate_dob(dob: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let date = NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDob)?;
    if date > today {
        return Err(ValidationError::InvalidDob);
    }
    Ok(date)
}

/// Every problem with the patient form, in field order.
///
/// Required-field checks come first; format checks only run on
/// non-empty values.
pub fn patient_errors(patient: &PatientInfo, today: NaiveDate) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        (Field::Name, &patient.name),
        (Field::Email, &patient.email),
        (Field::Phone, &patient.phone),
        (Field::Dob, &patient.dob),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Required(field));
        }
    }

    let email = patient.email.trim();
    if !email.is_empty() && !is_valid_email(email) {
        errors.push(ValidationError::InvalidEmail);
    }
    let phone = patient.phone.trim();
    if !phone.is_empty() && !is_valid_phone(phone) {
        errors.push(ValidationError::InvalidPhone);
    }
    if !patient.dob.trim().is_empty() {
        if let Err(e) = validate_dob(&patient.dob, today) {
            errors.push(e);
        }
    }

    errors
}

/// First violated patient constraint, if any.
pub fn validate_patient(patient: &PatientInfo, today: NaiveDate) -> Result<(), ValidationError> {
    match patient_errors(patient, today).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn validate_rating(rating: u8) -> Result<u8, ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ValidationError::InvalidRating(rating))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn jane() -> PatientInfo {
        PatientInfo {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "(555) 123-4567".into(),
            dob: "1990-01-01".into(),
            ..PatientInfo::default()
        }
    }

    #[test]
    fn phone_accepts_display_format_only() {
        assert!(is_valid_phone("(234) 567-8900"));
        assert!(!is_valid_phone("234-567-8900"));
        assert!(!is_valid_phone("2345678900"));
        assert!(!is_valid_phone("(234)567-8900"));
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn format_phone_normalizes_ten_digits() {
        assert_eq!(format_phone_number("2345678900"), "(234) 567-8900");
        assert_eq!(format_phone_number("234-567-8900"), "(234) 567-8900");
        assert_eq!(format_phone_number("12345"), "12345");
        assert!(is_valid_phone(&format_phone_number("234.567.8900")));
    }

    #[test]
    fn date_window_bounds() {
        let config = BookingConfig::default();
        let (earliest, latest) = booking_window(today(), &config);
        assert_eq!(earliest, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(latest, NaiveDate::from_ymd_opt(2025, 5, 30).unwrap());
    }

    #[test]
    fn today_is_not_bookable() {
        let err = validate_appointment_date(today(), today(), &BookingConfig::default())
            .unwrap_err();
        assert!(matches!(err, ValidationError::DateOutOfRange { .. }));
        assert_eq!(err.field(), Field::Date);
    }

    #[test]
    fn beyond_ninety_days_is_not_bookable() {
        let date = today() + Duration::days(91);
        let err = validate_appointment_date(date, today(), &BookingConfig::default())
            .unwrap_err();
        assert!(matches!(err, ValidationError::DateOutOfRange { .. }));
    }

    #[test]
    fn sunday_is_closed() {
        // 2025-03-09 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let err = validate_appointment_date(sunday, today(), &BookingConfig::default())
            .unwrap_err();
        assert_eq!(err, ValidationError::ClosedOnWeekday(Weekday::Sun));
        assert_eq!(err.to_string(), "Appointments are not available on Sundays.");
    }

    #[test]
    fn monday_in_range_is_bookable() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(validate_appointment_date(monday, today(), &BookingConfig::default()).is_ok());
    }

    #[test]
    fn dob_rules() {
        assert!(validate_dob("1990-01-01", today()).is_ok());
        assert_eq!(validate_dob("01/01/1990", today()), Err(ValidationError::InvalidDob));
        assert_eq!(validate_dob("2030-01-01", today()), Err(ValidationError::InvalidDob));
    }

    #[test]
    fn complete_patient_passes() {
        assert!(validate_patient(&jane(), today()).is_ok());
        assert!(patient_errors(&jane(), today()).is_empty());
    }

    #[test]
    fn missing_name_reported_first() {
        let patient = PatientInfo {
            name: "  ".into(),
            phone: "555".into(),
            ..jane()
        };
        let errors = patient_errors(&patient, today());
        assert_eq!(errors[0], ValidationError::Required(Field::Name));
        assert!(errors.contains(&ValidationError::InvalidPhone));
        assert_eq!(
            validate_patient(&patient, today()),
            Err(ValidationError::Required(Field::Name))
        );
    }

    #[test]
    fn malformed_email_rejected() {
        let patient = PatientInfo {
            email: "jane.example.com".into(),
            ..jane()
        };
        assert_eq!(validate_patient(&patient, today()), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn optional_fields_pass_through() {
        let patient = PatientInfo {
            allergies: Some("penicillin".into()),
            reason_for_visit: Some("chest pain".into()),
            ..jane()
        };
        assert!(validate_patient(&patient, today()).is_ok());
    }

    #[test]
    fn required_messages_are_specific() {
        assert_eq!(
            ValidationError::Required(Field::Service).to_string(),
            "Please select a service."
        );
        assert_eq!(
            ValidationError::Required(Field::Email).to_string(),
            "This field is required."
        );
    }

    #[test]
    fn rating_range() {
        assert_eq!(validate_rating(5), Ok(5));
        assert_eq!(validate_rating(0), Err(ValidationError::InvalidRating(0)));
        assert_eq!(validate_rating(6), Err(ValidationError::InvalidRating(6)));
    }
}
