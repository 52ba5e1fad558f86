//! iCalendar record and web calendar deep links for a confirmed booking.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{doctor_name, location, service_title, ExportError};
use crate::config::{BookingConfig, HOSPITAL_DOMAIN, HOSPITAL_NAME};
use crate::models::ConfirmedBooking;

const ICS_BASIC_UTC: &str = "%Y%m%dT%H%M%SZ";
const ICS_LINE_OCTETS: usize = 75;

/// The event fields shared by every calendar export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stamp: DateTime<Utc>,
    pub reminder_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarLinks {
    pub google: String,
    pub outlook: String,
    pub yahoo: String,
}

/// Build the event for a booking.
///
/// The slot time is hospital wall-clock time, placed in UTC by `config.to_utc`;
/// the event end is the start plus the appointment kind's duration.
pub fn calendar_event(
    booking: &ConfirmedBooking,
    config: &BookingConfig,
) -> Result<CalendarEvent, ExportError> {
    let details = &booking.details;
    let time = NaiveTime::parse_from_str(&details.time, "%H:%M")
        .map_err(|_| ExportError::InvalidTime(details.time.clone()))?;
    let start = config
        .to_utc(NaiveDateTime::new(details.date, time))
        .ok_or_else(|| ExportError::InvalidTime(details.time.clone()))?;
    let end = start + Duration::minutes(details.appointment_kind.duration_minutes());

    let service = service_title(booking);
    let doctor = doctor_name(booking);
    let description = format!(
        "{} with {}\nAppointment type: {}\nBooking ID: {}\nPlease arrive 15 minutes early.",
        service,
        doctor,
        details.appointment_kind.label(),
        booking.id,
    );

    Ok(CalendarEvent {
        uid: format!(
            "{}@{}",
            Uuid::new_v5(&Uuid::NAMESPACE_URL, booking.id.as_bytes()),
            HOSPITAL_DOMAIN
        ),
        title: format!("{service} Appointment - {HOSPITAL_NAME}"),
        description,
        location: location(booking),
        start,
        end,
        stamp: booking.created_at,
        reminder_minutes: config.reminder_minutes,
    })
}

// ── iCalendar ──────────────────────────────────────────────

/// Escape a TEXT value.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Fold a content line to 75 octets, never splitting a character.
fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / ICS_LINE_OCTETS * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > ICS_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out
}

/// Render the event as a VCALENDAR document with CRLF line endings.
pub fn to_ics(event: &CalendarEvent) -> String {
    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:-//{HOSPITAL_NAME}//Appointments//EN"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", event.uid),
        format!("DTSTAMP:{}", event.stamp.format(ICS_BASIC_UTC)),
        format!("DTSTART:{}", event.start.format(ICS_BASIC_UTC)),
        format!("DTEND:{}", event.end.format(ICS_BASIC_UTC)),
        format!("SUMMARY:{}", escape_text(&event.title)),
        format!("DESCRIPTION:{}", escape_text(&event.description)),
        format!("LOCATION:{}", escape_text(&event.location)),
        "STATUS:CONFIRMED".to_string(),
        "BEGIN:VALARM".to_string(),
        format!("TRIGGER:-PT{}M", event.reminder_minutes),
        "ACTION:DISPLAY".to_string(),
        format!("DESCRIPTION:{}", escape_text(&event.title)),
        "END:VALARM".to_string(),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];

    let mut ics = String::new();
    for line in &lines {
        ics.push_str(&fold_line(line));
        ics.push_str("\r\n");
    }
    ics
}

pub fn ics_filename(booking_id: &str) -> String {
    format!("appointment-{booking_id}.ics")
}

// ── Deep links ─────────────────────────────────────────────

/// Percent-encode everything except the URI-component unreserved set.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn query(base: &str, params: &[(&str, String)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", encode_component(v)))
        .collect();
    format!("{base}?{}", pairs.join("&"))
}

pub fn calendar_links(event: &CalendarEvent) -> CalendarLinks {
    let basic = |t: &DateTime<Utc>| t.format(ICS_BASIC_UTC).to_string();
    let iso = |t: &DateTime<Utc>| t.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let google = query(
        "https://calendar.google.com/calendar/render",
        &[
            ("action", "TEMPLATE".into()),
            ("text", event.title.clone()),
            ("dates", format!("{}/{}", basic(&event.start), basic(&event.end))),
            ("details", event.description.clone()),
            ("location", event.location.clone()),
        ],
    );
    let outlook = query(
        "https://outlook.live.com/calendar/0/deeplink/compose",
        &[
            ("path", "/calendar/action/compose".into()),
            ("rru", "addevent".into()),
            ("subject", event.title.clone()),
            ("startdt", iso(&event.start)),
            ("enddt", iso(&event.end)),
            ("body", event.description.clone()),
            ("location", event.location.clone()),
        ],
    );
    let yahoo = query(
        "https://calendar.yahoo.com/",
        &[
            ("v", "60".into()),
            ("title", event.title.clone()),
            ("st", basic(&event.start)),
            ("et", basic(&event.end)),
            ("desc", event.description.clone()),
            ("in_loc", event.location.clone()),
        ],
    );

    CalendarLinks {
        google,
        outlook,
        yahoo,
    }
}
