use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentKind, BookingStatus};

/// Patient details collected on the third wizard step.
///
/// The first four fields are required; everything else is passed
/// through as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dob: String, // YYYY-MM-DD
    pub gender: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub reason_for_visit: Option<String>,
}

/// In-progress appointment data, filled in step by step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftBooking {
    pub service: Option<String>,
    pub doctor: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>, // HH:MM slot id
    pub appointment_kind: AppointmentKind,
    /// Informational category carried over from the services page.
    pub category: Option<String>,
    pub patient: Option<PatientInfo>,
}

impl DraftBooking {
    /// Snapshot of the draft as a complete record, if every required
    /// field has been collected.
    pub fn details(&self) -> Option<BookingDetails> {
        Some(BookingDetails {
            service: self.service.clone()?,
            doctor: self.doctor.clone()?,
            date: self.date?,
            time: self.time.clone()?,
            appointment_kind: self.appointment_kind,
            patient: self.patient.clone()?,
        })
    }
}

/// A fully populated draft, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub service: String,
    pub doctor: String,
    pub date: NaiveDate,
    pub time: String,
    pub appointment_kind: AppointmentKind,
    pub patient: PatientInfo,
}

/// Finalized booking. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub id: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: BookingDetails,
}

/// Persisted wizard state for resuming a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// 1-based step number.
    pub step: u8,
    pub draft: DraftBooking,
    pub saved_at: DateTime<Utc>,
}
