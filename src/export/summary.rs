//! Printable appointment summary: plain text and an A4 PDF.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;
use serde::Serialize;

use super::{doctor_name, location, resolve, service_title, ExportError};
use crate::config::HOSPITAL_NAME;
use crate::models::{ConfirmedBooking, PatientInfo};

const ARRIVAL_NOTE: &str = "Please arrive 15 minutes before your appointment and bring a photo ID, \
your insurance card and a list of current medications. To reschedule or cancel, contact the \
department at least 24 hours in advance.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub heading: String,
    pub rows: Vec<(String, String)>,
}

/// Human-readable confirmation, shared by the text and PDF renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentSummary {
    pub title: String,
    pub booking_id: String,
    pub sections: Vec<SummarySection>,
    pub footer: String,
}

fn section(heading: &str, rows: Vec<(&str, String)>) -> SummarySection {
    SummarySection {
        heading: heading.to_string(),
        rows: rows.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

fn patient_rows(p: &PatientInfo) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Name", p.name.clone()),
        ("Email", p.email.clone()),
        ("Phone", p.phone.clone()),
        ("Date of birth", p.dob.clone()),
    ];
    let optional = [
        ("Gender", &p.gender),
        ("Address", &p.address),
        ("Emergency contact", &p.emergency_contact),
        ("Insurance provider", &p.insurance_provider),
        ("Insurance number", &p.insurance_number),
        ("Medical history", &p.medical_history),
        ("Current medications", &p.current_medications),
        ("Allergies", &p.allergies),
        ("Reason for visit", &p.reason_for_visit),
    ];
    for (label, value) in optional {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            rows.push((label, v.to_string()));
        }
    }
    rows
}

pub fn build_summary(booking: &ConfirmedBooking) -> AppointmentSummary {
    let details = &booking.details;
    let (service, doctor) = resolve(booking);

    let doctor_line = match doctor {
        Some(d) => format!("{} ({})", d.name, d.specialty),
        None => doctor_name(booking),
    };
    let mut appointment = vec![
        ("Service", service_title(booking)),
        ("Doctor", doctor_line),
        ("Date", details.date.format("%A, %B %-d, %Y").to_string()),
        (
            "Time",
            format!(
                "{} ({} minutes)",
                details.time,
                details.appointment_kind.duration_minutes()
            ),
        ),
        ("Type", details.appointment_kind.label().to_string()),
        ("Location", location(booking)),
    ];
    if let Some(s) = service {
        appointment.push(("Contact", format!("{} / {}", s.contact.phone, s.contact.email)));
    }

    AppointmentSummary {
        title: format!("{HOSPITAL_NAME} - Appointment Confirmation"),
        booking_id: booking.id.clone(),
        sections: vec![
            section(
                "Booking",
                vec![
                    ("Booking ID", booking.id.clone()),
                    ("Status", booking.status.to_string()),
                    ("Booked on", booking.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
                ],
            ),
            section("Appointment", appointment),
            section("Patient", patient_rows(&details.patient)),
        ],
        footer: ARRIVAL_NOTE.to_string(),
    }
}

pub fn render_text(summary: &AppointmentSummary) -> String {
    let mut out = String::new();
    out.push_str(&summary.title);
    out.push('\n');
    out.push_str(&"=".repeat(summary.title.chars().count()));
    out.push('\n');
    for s in &summary.sections {
        out.push('\n');
        out.push_str(&s.heading.to_uppercase());
        out.push('\n');
        for (label, value) in &s.rows {
            out.push_str(&format!("  {label}: {value}\n"));
        }
    }
    out.push('\n');
    for line in wrap_text(&summary.footer, 72) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

// ─── PDF generation ───────────────────────────────────────────────────────────

const PAGE_W: Mm = Mm(210.0);
const PAGE_H: Mm = Mm(297.0);
const BOTTOM_MARGIN_MM: f32 = 20.0;

fn pdf_err(context: &str, e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(format!("{context}: {e}"))
}

/// Render the summary as an A4 PDF. Returns PDF bytes.
pub fn generate_summary_pdf(summary: &AppointmentSummary) -> Result<Vec<u8>, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new(&summary.title, PAGE_W, PAGE_H, "Layer 1");
    let mut layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| pdf_err("font", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| pdf_err("font", e))?;

    let mut y = Mm(280.0);

    layer.use_text(&summary.title, 14.0, Mm(20.0), y, &bold);
    y -= Mm(10.0);

    for s in &summary.sections {
        if y.0 < BOTTOM_MARGIN_MM + 12.0 {
            let (page, l) = doc.add_page(PAGE_W, PAGE_H, "Layer 1");
            layer = doc.get_page(page).get_layer(l);
            y = Mm(280.0);
        }
        layer.use_text(s.heading.to_uppercase(), 11.0, Mm(20.0), y, &bold);
        y -= Mm(6.0);
        for (label, value) in &s.rows {
            for (i, line) in wrap_text(&format!("{label}: {value}"), 85).iter().enumerate() {
                if y.0 < BOTTOM_MARGIN_MM {
                    let (page, l) = doc.add_page(PAGE_W, PAGE_H, "Layer 1");
                    layer = doc.get_page(page).get_layer(l);
                    y = Mm(280.0);
                }
                let x = if i == 0 { Mm(25.0) } else { Mm(30.0) };
                layer.use_text(line, 9.0, x, y, &font);
                y -= Mm(4.5);
            }
        }
        y -= Mm(4.0);
    }

    y -= Mm(4.0);
    for line in wrap_text(&summary.footer, 95) {
        layer.use_text(&line, 8.0, Mm(20.0), y, &font);
        y -= Mm(3.5);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(|e| pdf_err("save", e))?;
    buf.into_inner().map_err(|e| pdf_err("buffer", e))
}

pub fn pdf_filename(booking_id: &str) -> String {
    format!("appointment-{booking_id}.pdf")
}

/// Write export bytes into `dir`, creating it if needed.
pub fn export_to_file(bytes: &[u8], filename: &str, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), "Export written");
    Ok(path)
}

/// Simple word-wrap helper for text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
