//! Exports for a confirmed booking: calendar interop and printable summary.

pub mod calendar;
pub mod summary;

pub use calendar::*;
pub use summary::*;

use thiserror::Error;

use crate::catalog::{self, Doctor, Service};
use crate::models::ConfirmedBooking;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Catalog entries a booking refers to, when still known.
pub(crate) fn resolve(booking: &ConfirmedBooking) -> (Option<&'static Service>, Option<&'static Doctor>) {
    let service = catalog::find_service(&booking.details.service);
    let doctor = service.and_then(|s| s.doctor(&booking.details.doctor));
    (service, doctor)
}

pub(crate) fn service_title(booking: &ConfirmedBooking) -> String {
    match resolve(booking).0 {
        Some(s) => s.title.to_string(),
        None => booking.details.service.clone(),
    }
}

pub(crate) fn doctor_name(booking: &ConfirmedBooking) -> String {
    match resolve(booking).1 {
        Some(d) => d.name.to_string(),
        None => booking.details.doctor.clone(),
    }
}

/// Where the appointment takes place.
pub(crate) fn location(booking: &ConfirmedBooking) -> String {
    match resolve(booking).0 {
        Some(s) => format!("{}, {}", s.contact.department, crate::config::HOSPITAL_ADDRESS),
        None => crate::config::HOSPITAL_ADDRESS.to_string(),
    }
}
