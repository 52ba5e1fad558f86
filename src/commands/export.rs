//! Export commands for a confirmed booking.
//!
//! `booking_id` selects a stored booking; `None` means the booking the
//! wizard just confirmed.

use serde::Serialize;

use super::Notification;
use crate::core_state::{CoreError, CoreState};
use crate::export::{self, CalendarLinks};

#[derive(Debug, Clone, Serialize)]
pub struct CalendarExport {
    pub filename: String,
    pub ics: String,
    pub links: CalendarLinks,
}

pub async fn calendar_export(
    state: &CoreState,
    booking_id: Option<&str>,
) -> Result<CalendarExport, Notification> {
    let booking = state.booking(booking_id).await?;
    let event = export::calendar_event(&booking, state.config()).map_err(CoreError::from)?;
    Ok(CalendarExport {
        filename: export::ics_filename(&booking.id),
        ics: export::to_ics(&event),
        links: export::calendar_links(&event),
    })
}

/// Write the `.ics` file to the exports directory. Returns its path.
pub async fn save_calendar_file(
    state: &CoreState,
    booking_id: Option<&str>,
) -> Result<String, Notification> {
    let cal = calendar_export(state, booking_id).await?;
    let path = export::export_to_file(cal.ics.as_bytes(), &cal.filename, &state.exports_dir)
        .map_err(CoreError::from)?;
    Ok(path.to_string_lossy().into_owned())
}

/// Plain-text summary for printing.
pub async fn print_summary(
    state: &CoreState,
    booking_id: Option<&str>,
) -> Result<String, Notification> {
    let booking = state.booking(booking_id).await?;
    Ok(export::render_text(&export::build_summary(&booking)))
}

/// Render the summary PDF into the exports directory. Returns its path.
pub async fn export_summary_pdf(
    state: &CoreState,
    booking_id: Option<&str>,
) -> Result<String, Notification> {
    let booking = state.booking(booking_id).await?;
    let pdf = export::generate_summary_pdf(&export::build_summary(&booking))
        .map_err(CoreError::from)?;
    let path = export::export_to_file(&pdf, &export::pdf_filename(&booking.id), &state.exports_dir)
        .map_err(CoreError::from)?;
    Ok(path.to_string_lossy().into_owned())
}
