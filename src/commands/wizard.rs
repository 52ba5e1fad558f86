//! Booking wizard commands.
//!
//! Every command returns the full [`WizardView`] so the view layer can
//! re-render from a single source of truth.

use chrono::NaiveDate;
use serde::Serialize;

use super::Notification;
use crate::availability::{group_by_period, TimeSlot};
use crate::catalog::{self, Doctor, Service};
use crate::core_state::{CoreError, CoreState};
use crate::models::{AppointmentKind, ConfirmedBooking, DraftBooking, PatientInfo, SlotPeriod};
use crate::validation::{Field, ValidationError};
use crate::wizard::{BookingWizard, StepIndicator, WizardForm};

#[derive(Debug, Clone, Serialize)]
pub struct SlotGroup {
    pub period: SlotPeriod,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldMessage {
    pub field: Field,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub indicator: StepIndicator,
    pub form: WizardForm,
    pub draft: DraftBooking,
    pub services: &'static [Service],
    /// Doctors of the currently selected service.
    pub doctors: &'static [Doctor],
    pub appointment_kinds: Vec<AppointmentKindOption>,
    pub earliest_date: NaiveDate,
    pub latest_date: NaiveDate,
    pub slots: Vec<SlotGroup>,
    pub terms_accepted: bool,
    pub confirmed: Option<ConfirmedBooking>,
    pub notice: Option<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentKindOption {
    pub kind: AppointmentKind,
    pub label: &'static str,
    pub duration_minutes: i64,
}

fn view(wizard: &BookingWizard, notice: Option<Notification>) -> WizardView {
    let (earliest_date, latest_date) = wizard.booking_window();
    let doctors = wizard
        .form()
        .service
        .as_deref()
        .and_then(catalog::find_service)
        .map(|s| s.doctors)
        .unwrap_or(&[]);
    WizardView {
        indicator: wizard.indicator(),
        form: wizard.form().clone(),
        draft: wizard.draft().clone(),
        services: catalog::SERVICES,
        doctors,
        appointment_kinds: AppointmentKind::ALL
            .iter()
            .map(|k| AppointmentKindOption {
                kind: *k,
                label: k.label(),
                duration_minutes: k.duration_minutes(),
            })
            .collect(),
        earliest_date,
        latest_date,
        slots: group_by_period(wizard.slots())
            .into_iter()
            .map(|(period, slots)| SlotGroup {
                period,
                slots: slots.into_iter().cloned().collect(),
            })
            .collect(),
        terms_accepted: wizard.terms_accepted(),
        confirmed: wizard.confirmed().cloned(),
        notice,
    }
}

/// Open the wizard: resume recent progress, else apply the page query.
pub async fn start_wizard(state: &CoreState, query: Option<&str>) -> Result<WizardView, Notification> {
    let mut wizard = state.wizard().await;
    let resumed = wizard.resume().await.map_err(Notification::from)?;
    let notice = match resumed {
        Some(step) => Some(Notification::info(format!(
            "Welcome back! Your progress has been restored at step {}.",
            step.number()
        ))),
        None => {
            if let Some(q) = query {
                wizard.preselect(&catalog::parse_booking_query(q));
            }
            None
        }
    };
    Ok(view(&wizard, notice))
}

pub async fn get_wizard(state: &CoreState) -> WizardView {
    view(&*state.wizard().await, None)
}

pub async fn select_service(state: &CoreState, service_id: &str) -> Result<WizardView, Notification> {
    let mut wizard = state.wizard().await;
    wizard.select_service(service_id)?;
    Ok(view(&wizard, None))
}

pub async fn select_doctor(state: &CoreState, doctor_id: &str) -> Result<WizardView, Notification> {
    let mut wizard = state.wizard().await;
    wizard.select_doctor(doctor_id)?;
    Ok(view(&wizard, None))
}

/// `date` is `YYYY-MM-DD`.
pub async fn select_date(state: &CoreState, date: &str) -> Result<WizardView, Notification> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| Notification::from(ValidationError::Required(Field::Date)))?;
    let mut wizard = state.wizard().await;
    wizard.select_date(date).await?;
    Ok(view(&wizard, None))
}

pub async fn select_time(state: &CoreState, time: &str) -> Result<WizardView, Notification> {
    let mut wizard = state.wizard().await;
    wizard.select_time(time)?;
    Ok(view(&wizard, None))
}

pub async fn set_appointment_kind(state: &CoreState, kind: &str) -> Result<WizardView, Notification> {
    let kind: AppointmentKind = kind
        .parse()
        .map_err(|_| Notification::error(format!("Unknown appointment type: {kind}")))?;
    let mut wizard = state.wizard().await;
    wizard.set_appointment_kind(kind);
    Ok(view(&wizard, None))
}

pub async fn update_patient(state: &CoreState, patient: PatientInfo) -> WizardView {
    let mut wizard = state.wizard().await;
    wizard.set_patient(patient);
    view(&wizard, None)
}

/// Inline errors for the current step, without moving.
pub async fn check_step(state: &CoreState) -> Vec<FieldMessage> {
    state
        .wizard()
        .await
        .field_errors()
        .into_iter()
        .map(|e| FieldMessage {
            field: e.field(),
            message: e.to_string(),
        })
        .collect()
}

pub async fn accept_terms(state: &CoreState, accepted: bool) -> WizardView {
    let mut wizard = state.wizard().await;
    wizard.accept_terms(accepted);
    view(&wizard, None)
}

pub async fn next_step(state: &CoreState) -> Result<WizardView, Notification> {
    let mut wizard = state.wizard().await;
    wizard.advance().await?;
    Ok(view(&wizard, None))
}

pub async fn previous_step(state: &CoreState) -> WizardView {
    let mut wizard = state.wizard().await;
    wizard.retreat().await;
    view(&wizard, None)
}

pub async fn submit_booking(state: &CoreState) -> Result<WizardView, Notification> {
    let booking = state.submit().await?;
    let wizard = state.wizard().await;
    let mut message = format!(
        "Appointment booked successfully! Your booking ID is {}.",
        booking.id
    );
    if !wizard.is_stored() {
        message.push_str(" It could not be saved on this device, so please keep a note of it.");
    }
    Ok(view(&wizard, Some(Notification::success(message))))
}

/// Start over with an empty wizard.
pub async fn new_booking(state: &CoreState) -> Result<WizardView, Notification> {
    let mut wizard = state.wizard().await;
    wizard.reset()?;
    Ok(view(&wizard, None))
}

pub fn list_bookings(state: &CoreState) -> Result<Vec<ConfirmedBooking>, Notification> {
    state
        .store()
        .load_bookings()
        .map_err(|e| Notification::from(CoreError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::RandomAvailability;
    use crate::booking::SimulatedBackend;
    use crate::clock::FixedClock;
    use crate::config::BookingConfig;
    use crate::db::MemoryStore;
    use crate::models::NotificationKind;
    use crate::persistence::BookingStore;
    use crate::wizard::WizardStep;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn state(success_rate: f64) -> CoreState {
        let config = BookingConfig {
            availability_ratio: 1.0,
            success_rate,
            ..BookingConfig::instant()
        };
        let wizard = BookingWizard::new(
            config.clone(),
            Arc::new(RandomAvailability::seeded(config.clone(), 4)),
            Arc::new(SimulatedBackend::seeded(&config, 4)),
            BookingStore::new(Arc::new(MemoryStore::new())),
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())),
        );
        CoreState::new(wizard, std::env::temp_dir())
    }

    async fn walk_to_review(state: &CoreState) {
        select_service(state, "cardiology").await.unwrap();
        select_doctor(state, "dr-smith").await.unwrap();
        next_step(state).await.unwrap();
        select_date(state, "2025-03-10").await.unwrap();
        select_time(state, "11:00").await.unwrap();
        next_step(state).await.unwrap();
        update_patient(
            state,
            PatientInfo {
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
                phone: "5551234567".into(),
                dob: "1990-01-01".into(),
                ..PatientInfo::default()
            },
        )
        .await;
        let view = next_step(state).await.unwrap();
        assert_eq!(view.indicator.current, 4);
    }

    #[tokio::test]
    async fn start_applies_query_preselection() {
        let state = state(1.0);
        let view = start_wizard(&state, Some("?service=neurology&category=specialty"))
            .await
            .unwrap();
        assert!(view.notice.is_none());
        assert_eq!(view.form.service.as_deref(), Some("neurology"));
        assert_eq!(view.doctors.len(), 2);
        assert_eq!(view.services.len(), 6);
        assert_eq!(view.appointment_kinds.len(), 4);
    }

    #[tokio::test]
    async fn start_resumes_saved_progress() {
        let state = state(1.0);
        select_service(&state, "cardiology").await.unwrap();
        select_doctor(&state, "dr-smith").await.unwrap();
        next_step(&state).await.unwrap();

        let view = start_wizard(&state, Some("?service=radiology")).await.unwrap();
        assert_eq!(view.indicator.current, WizardStep::ChooseDateAndTime.number());
        assert_eq!(view.notice.unwrap().kind, NotificationKind::Info);
        assert_eq!(view.form.service.as_deref(), Some("cardiology"));
    }

    #[tokio::test]
    async fn failed_advance_reports_field() {
        let state = state(1.0);
        let err = next_step(&state).await.unwrap_err();
        assert_eq!(err.field, Some(Field::Service));
        assert_eq!(err.kind, NotificationKind::Error);
        assert_eq!(get_wizard(&state).await.indicator.current, 1);
    }

    #[tokio::test]
    async fn bad_date_text_rejected() {
        let state = state(1.0);
        let err = select_date(&state, "10/03/2025").await.unwrap_err();
        assert_eq!(err.field, Some(Field::Date));
    }

    #[tokio::test]
    async fn unknown_kind_rejected() {
        let state = state(1.0);
        assert!(set_appointment_kind(&state, "checkup").await.is_err());
        let view = set_appointment_kind(&state, "procedure").await.unwrap();
        assert_eq!(view.form.appointment_kind, AppointmentKind::Procedure);
    }

    #[tokio::test]
    async fn slots_grouped_by_period() {
        let state = state(1.0);
        select_service(&state, "cardiology").await.unwrap();
        select_doctor(&state, "dr-smith").await.unwrap();
        next_step(&state).await.unwrap();
        let view = select_date(&state, "2025-03-10").await.unwrap();
        assert_eq!(view.slots.len(), 4);
        assert_eq!(view.slots.iter().map(|g| g.slots.len()).sum::<usize>(), 20);
    }

    #[tokio::test]
    async fn check_step_lists_all_patient_errors() {
        let state = state(1.0);
        select_service(&state, "cardiology").await.unwrap();
        select_doctor(&state, "dr-smith").await.unwrap();
        next_step(&state).await.unwrap();
        select_date(&state, "2025-03-10").await.unwrap();
        select_time(&state, "11:00").await.unwrap();
        next_step(&state).await.unwrap();

        let errors = check_step(&state).await;
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, [Field::Name, Field::Email, Field::Phone, Field::Dob]);
    }

    #[tokio::test]
    async fn submit_flow_and_new_booking() {
        let state = state(1.0);
        walk_to_review(&state).await;

        let err = submit_booking(&state).await.unwrap_err();
        assert_eq!(err.field, Some(Field::Terms));

        accept_terms(&state, true).await;
        let view = submit_booking(&state).await.unwrap();
        let booking = view.confirmed.unwrap();
        let notice = view.notice.unwrap();
        assert_eq!(notice.kind, NotificationKind::Success);
        assert!(!notice.message.contains("could not be saved"));
        assert_eq!(booking.details.patient.phone, "(555) 123-4567");
        assert_eq!(list_bookings(&state).unwrap(), vec![booking]);

        let view = new_booking(&state).await.unwrap();
        assert_eq!(view.indicator.current, 1);
        assert!(view.confirmed.is_none());
        assert_eq!(list_bookings(&state).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_submit_keeps_review_step() {
        let state = state(0.0);
        walk_to_review(&state).await;
        accept_terms(&state, true).await;

        let err = submit_booking(&state).await.unwrap_err();
        assert_eq!(err.kind, NotificationKind::Error);
        let view = get_wizard(&state).await;
        assert_eq!(view.indicator.current, 4);
        assert!(view.indicator.show_submit);
        assert!(view.draft.details().is_some());
    }

    #[tokio::test]
    async fn previous_step_from_first_is_noop() {
        let state = state(1.0);
        assert_eq!(previous_step(&state).await.indicator.current, 1);
    }

    #[tokio::test]
    async fn start_after_confirmation_keeps_booking() {
        let state = state(1.0);
        walk_to_review(&state).await;
        accept_terms(&state, true).await;
        let booking = submit_booking(&state).await.unwrap().confirmed.unwrap();

        let view = start_wizard(&state, Some("?service=radiology")).await.unwrap();
        assert_eq!(view.confirmed, Some(booking));
        assert_eq!(view.form.service.as_deref(), Some("cardiology"));
        assert_eq!(view.draft.category, None);
    }
}
