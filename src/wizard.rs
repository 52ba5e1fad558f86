//! Appointment booking wizard.
//!
//! Four ordered steps, no skipping:
//! `SelectServiceAndDoctor → ChooseDateAndTime → PatientInformation → ReviewAndConfirm`.
//!
//! Input lands in a [`WizardForm`] as the user edits it. `advance()`
//! validates the current step's part of the form and, on success, copies
//! it into the [`DraftBooking`]. Only a draft that passed all steps in
//! order can be submitted. Every successful transition persists a
//! [`ProgressSnapshot`] so a visit within the resume window picks up
//! where the last one stopped.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::availability::{AvailabilitySource, RandomAvailability, TimeSlot};
use crate::booking::{BookingBackend, SimulatedBackend, SubmissionError};
use crate::catalog::{self, Doctor, Preselection, Service};
use crate::clock::{Clock, SystemClock};
use crate::config::BookingConfig;
use crate::db::DatabaseError;
use crate::models::{
    AppointmentKind, ConfirmedBooking, DraftBooking, PatientInfo, ProgressSnapshot, StepStatus,
};
use crate::persistence::BookingStore;
use crate::validation::{self, Field, ValidationError};

// ═══════════════════════════════════════════════════════════
// Steps
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    SelectServiceAndDoctor,
    ChooseDateAndTime,
    PatientInformation,
    ReviewAndConfirm,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        Self::SelectServiceAndDoctor,
        Self::ChooseDateAndTime,
        Self::PatientInformation,
        Self::ReviewAndConfirm,
    ];

    /// 1-based position.
    pub fn number(&self) -> u8 {
        match self {
            Self::SelectServiceAndDoctor => 1,
            Self::ChooseDateAndTime => 2,
            Self::PatientInformation => 3,
            Self::ReviewAndConfirm => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::SelectServiceAndDoctor => "Select Service & Doctor",
            Self::ChooseDateAndTime => "Choose Date & Time",
            Self::PatientInformation => "Patient Information",
            Self::ReviewAndConfirm => "Review & Confirm",
        }
    }

    /// Next step, capped at the terminal step.
    pub fn next(&self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(*self)
    }

    /// Previous step, floored at the first step.
    pub fn prev(&self) -> Self {
        Self::from_number(self.number() - 1).unwrap_or(*self)
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::ReviewAndConfirm
    }
}

/// Raw input as currently entered, before step validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardForm {
    pub service: Option<String>,
    pub doctor: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub appointment_kind: AppointmentKind,
    pub patient: PatientInfo,
}

/// One entry of the step indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub number: u8,
    pub title: &'static str,
    pub status: StepStatus,
}

/// Everything the view needs to draw progress and navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub current: u8,
    pub title: &'static str,
    pub steps: Vec<StepView>,
    pub progress_percent: u8,
    pub can_go_back: bool,
    pub show_next: bool,
    pub show_submit: bool,
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Bookings can only be submitted from the review step")]
    NotAtReview,

    #[error("This booking has already been confirmed")]
    AlreadyConfirmed,

    #[error("Booking details are incomplete")]
    Incomplete,
}

// ═══════════════════════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════════════════════

pub struct BookingWizard {
    config: BookingConfig,
    availability: Arc<dyn AvailabilitySource>,
    backend: Arc<dyn BookingBackend>,
    store: BookingStore,
    clock: Arc<dyn Clock>,
    step: WizardStep,
    form: WizardForm,
    draft: DraftBooking,
    /// Grid for `slots_date`; regenerated on every load.
    slots: Vec<TimeSlot>,
    slots_date: Option<NaiveDate>,
    terms_accepted: bool,
    confirmed: Option<ConfirmedBooking>,
    /// Whether the confirmed booking reached local storage.
    stored: bool,
}

impl BookingWizard {
    pub fn new(
        config: BookingConfig,
        availability: Arc<dyn AvailabilitySource>,
        backend: Arc<dyn BookingBackend>,
        store: BookingStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            availability,
            backend,
            store,
            clock,
            step: WizardStep::SelectServiceAndDoctor,
            form: WizardForm::default(),
            draft: DraftBooking::default(),
            slots: Vec::new(),
            slots_date: None,
            terms_accepted: false,
            confirmed: None,
            stored: false,
        }
    }

    /// Wizard over the random availability and simulated backend.
    pub fn simulated(config: BookingConfig, store: BookingStore) -> Self {
        let availability = Arc::new(RandomAvailability::new(config.clone()));
        let backend = Arc::new(SimulatedBackend::new(&config));
        Self::new(config, availability, backend, store, Arc::new(SystemClock))
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    pub fn draft(&self) -> &DraftBooking {
        &self.draft
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    pub fn confirmed(&self) -> Option<&ConfirmedBooking> {
        self.confirmed.as_ref()
    }

    /// `false` when the confirmed booking could not be written locally.
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    /// First and last bookable dates as of today.
    pub fn booking_window(&self) -> (NaiveDate, NaiveDate) {
        validation::booking_window(self.clock.today(), &self.config)
    }

    // ── Session start ───────────────────────────────────────

    /// Apply a pre-selection from the appointments-page query string.
    ///
    /// Ignored once a booking is confirmed.
    pub fn preselect(&mut self, pre: &Preselection) {
        if self.confirmed.is_some() {
            tracing::debug!("Pre-selection ignored on confirmed booking");
            return;
        }
        if let Some(service) = pre.service.as_deref() {
            if self.select_service(service).is_ok() {
                self.draft.service = Some(service.to_string());
                tracing::info!(service, "Service pre-selected");
            }
        }
        if let Some(category) = &pre.category {
            self.draft.category = Some(category.clone());
        }
    }

    /// Restore a recent progress snapshot, if one exists.
    ///
    /// Returns the restored step, or `None` when starting fresh.
    pub async fn resume(&mut self) -> Result<Option<WizardStep>, WizardError> {
        let max_age = Duration::minutes(self.config.resume_window_minutes);
        let snapshot = match self.store.load_progress(self.clock.now(), max_age)? {
            Some(s) => s,
            None => return Ok(None),
        };
        let step = match WizardStep::from_number(snapshot.step) {
            Some(step) => step,
            None => {
                tracing::warn!(step = snapshot.step, "Discarding snapshot with unknown step");
                self.store.clear_progress()?;
                return Ok(None);
            }
        };

        self.step = step;
        self.form = WizardForm {
            service: snapshot.draft.service.clone(),
            doctor: snapshot.draft.doctor.clone(),
            date: snapshot.draft.date,
            time: snapshot.draft.time.clone(),
            appointment_kind: snapshot.draft.appointment_kind,
            patient: snapshot.draft.patient.clone().unwrap_or_default(),
        };
        self.draft = snapshot.draft;
        tracing::info!(step = step.number(), "Resumed booking progress");

        self.enter_step().await;
        Ok(Some(step))
    }

    /// Discard everything and start a new booking.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        self.step = WizardStep::SelectServiceAndDoctor;
        self.form = WizardForm::default();
        self.draft = DraftBooking::default();
        self.slots.clear();
        self.slots_date = None;
        self.terms_accepted = false;
        self.confirmed = None;
        self.stored = false;
        self.store.clear_progress()?;
        Ok(())
    }

    // ── Form input ──────────────────────────────────────────

    pub fn select_service(&mut self, service_id: &str) -> Result<&'static Service, WizardError> {
        let service = catalog::find_service(service_id)
            .ok_or_else(|| ValidationError::UnknownService(service_id.to_string()))?;
        let keeps_doctor = self
            .form
            .doctor
            .as_deref()
            .is_some_and(|d| service.doctor(d).is_some());
        if !keeps_doctor {
            self.form.doctor = None;
        }
        self.form.service = Some(service.id.to_string());
        Ok(service)
    }

    pub fn select_doctor(&mut self, doctor_id: &str) -> Result<&'static Doctor, WizardError> {
        let service_id = self
            .form
            .service
            .as_deref()
            .ok_or(ValidationError::Required(Field::Service))?;
        let doctor = catalog::find_doctor(service_id, doctor_id).ok_or_else(|| {
            ValidationError::DoctorNotInService {
                doctor: doctor_id.to_string(),
                service: service_id.to_string(),
            }
        })?;
        self.form.doctor = Some(doctor.id.to_string());
        tracing::debug!(doctor = doctor.id, "Doctor selected");
        Ok(doctor)
    }

    /// Pick a date and load its slot grid. Clears any chosen time.
    pub async fn select_date(&mut self, date: NaiveDate) -> Result<&[TimeSlot], WizardError> {
        validation::validate_appointment_date(date, self.clock.today(), &self.config)?;
        self.form.date = Some(date);
        self.form.time = None;
        self.load_slots(date).await;
        Ok(&self.slots)
    }

    pub fn select_time(&mut self, time: &str) -> Result<(), WizardError> {
        let date = self.form.date.ok_or(ValidationError::Required(Field::Date))?;
        if !self.is_slot_open(date, time) {
            return Err(ValidationError::SlotUnavailable(time.to_string()).into());
        }
        self.form.time = Some(time.to_string());
        Ok(())
    }

    pub fn set_appointment_kind(&mut self, kind: AppointmentKind) {
        self.form.appointment_kind = kind;
    }

    /// Replace the patient form. The phone number is normalized.
    pub fn set_patient(&mut self, mut patient: PatientInfo) {
        patient.phone = validation::format_phone_number(&patient.phone);
        self.form.patient = patient;
    }

    pub fn accept_terms(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
    }

    // ── Validation ──────────────────────────────────────────

    fn is_slot_open(&self, date: NaiveDate, time: &str) -> bool {
        self.slots_date == Some(date)
            && self.slots.iter().any(|s| s.time == time && s.available)
    }

    /// First violated constraint of the current step.
    pub fn validate_current(&self) -> Result<(), ValidationError> {
        match self.step {
            WizardStep::SelectServiceAndDoctor => {
                let service_id = self
                    .form
                    .service
                    .as_deref()
                    .ok_or(ValidationError::Required(Field::Service))?;
                let service = catalog::find_service(service_id)
                    .ok_or_else(|| ValidationError::UnknownService(service_id.to_string()))?;
                let doctor_id = self
                    .form
                    .doctor
                    .as_deref()
                    .ok_or(ValidationError::Required(Field::Doctor))?;
                if service.doctor(doctor_id).is_none() {
                    return Err(ValidationError::DoctorNotInService {
                        doctor: doctor_id.to_string(),
                        service: service_id.to_string(),
                    });
                }
                Ok(())
            }
            WizardStep::ChooseDateAndTime => {
                let date = self.form.date.ok_or(ValidationError::Required(Field::Date))?;
                validation::validate_appointment_date(date, self.clock.today(), &self.config)?;
                let time = self
                    .form
                    .time
                    .as_deref()
                    .ok_or(ValidationError::Required(Field::Time))?;
                if !self.is_slot_open(date, time) {
                    return Err(ValidationError::SlotUnavailable(time.to_string()));
                }
                Ok(())
            }
            WizardStep::PatientInformation => {
                validation::validate_patient(&self.form.patient, self.clock.today())
            }
            WizardStep::ReviewAndConfirm => Ok(()),
        }
    }

    /// Every problem with the current step, for inline field errors.
    pub fn field_errors(&self) -> Vec<ValidationError> {
        match self.step {
            WizardStep::PatientInformation => {
                validation::patient_errors(&self.form.patient, self.clock.today())
            }
            _ => self.validate_current().err().into_iter().collect(),
        }
    }

    fn commit_current(&mut self) {
        match self.step {
            WizardStep::SelectServiceAndDoctor => {
                self.draft.service = self.form.service.clone();
                self.draft.doctor = self.form.doctor.clone();
            }
            WizardStep::ChooseDateAndTime => {
                self.draft.date = self.form.date;
                self.draft.time = self.form.time.clone();
                self.draft.appointment_kind = self.form.appointment_kind;
            }
            WizardStep::PatientInformation => {
                self.draft.patient = Some(self.form.patient.clone());
            }
            WizardStep::ReviewAndConfirm => {}
        }
    }

    // ── Transitions ─────────────────────────────────────────

    /// Validate the current step and move forward one step.
    ///
    /// On validation failure nothing changes and the first violated
    /// constraint is returned.
    pub async fn advance(&mut self) -> Result<WizardStep, WizardError> {
        if self.confirmed.is_some() {
            return Err(WizardError::AlreadyConfirmed);
        }
        if let Err(e) = self.validate_current() {
            tracing::debug!(step = self.step.number(), field = ?e.field(), "Step validation failed");
            return Err(e.into());
        }

        self.commit_current();
        let from = self.step;
        self.step = from.next();
        self.save_progress();

        if self.step != from {
            tracing::info!(from = from.number(), to = self.step.number(), "Wizard advanced");
            self.enter_step().await;
        }
        Ok(self.step)
    }

    /// Move back one step without validation. Nothing is discarded.
    ///
    /// Landing on the date step loads the grid if the chosen date has
    /// none yet, as after resuming at a later step.
    pub async fn retreat(&mut self) -> WizardStep {
        if self.confirmed.is_some() || self.step == WizardStep::SelectServiceAndDoctor {
            return self.step;
        }
        let from = self.step;
        self.step = from.prev();
        self.save_progress();
        tracing::info!(from = from.number(), to = self.step.number(), "Wizard moved back");

        if self.step == WizardStep::ChooseDateAndTime && self.slots_date != self.form.date {
            self.enter_step().await;
        }
        self.step
    }

    /// Step-specific loading on entry.
    async fn enter_step(&mut self) {
        if self.step == WizardStep::ChooseDateAndTime {
            if let Some(date) = self.form.date {
                self.load_slots(date).await;
            }
        }
    }

    async fn load_slots(&mut self, date: NaiveDate) {
        let latency = self.availability.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.slots = self.availability.slots_for(date);
        self.slots_date = Some(date);

        // A fresh grid may no longer offer the slot picked earlier
        if let Some(time) = self.form.time.clone() {
            if !self.is_slot_open(date, &time) {
                tracing::info!(%date, %time, "Previously selected slot no longer offered");
                self.form.time = None;
            }
        }
    }

    fn save_progress(&self) {
        let snapshot = ProgressSnapshot {
            step: self.step.number(),
            draft: self.draft.clone(),
            saved_at: self.clock.now(),
        };
        if let Err(e) = self.store.save_progress(&snapshot) {
            tracing::warn!("Failed to save booking progress: {e}");
        }
    }

    pub fn indicator(&self) -> StepIndicator {
        let current = self.step.number();
        let total = WizardStep::ALL.len() as u32;
        let steps = WizardStep::ALL
            .iter()
            .map(|s| StepView {
                number: s.number(),
                title: s.title(),
                status: match s.number().cmp(&current) {
                    std::cmp::Ordering::Less => StepStatus::Completed,
                    std::cmp::Ordering::Equal => StepStatus::Active,
                    std::cmp::Ordering::Greater => StepStatus::Upcoming,
                },
            })
            .collect();
        StepIndicator {
            current,
            title: self.step.title(),
            steps,
            progress_percent: ((u32::from(current) - 1) * 100 / (total - 1)) as u8,
            can_go_back: current > 1 && self.confirmed.is_none(),
            show_next: !self.step.is_terminal(),
            show_submit: self.step.is_terminal() && self.confirmed.is_none(),
        }
    }

    // ── Submission ──────────────────────────────────────────

    /// Submit the reviewed draft.
    ///
    /// Requires the review step and accepted terms. A failed attempt
    /// leaves the draft untouched for an immediate retry.
    pub async fn submit(&mut self) -> Result<ConfirmedBooking, WizardError> {
        if self.confirmed.is_some() {
            return Err(WizardError::AlreadyConfirmed);
        }
        if !self.step.is_terminal() {
            return Err(WizardError::NotAtReview);
        }
        if !self.terms_accepted {
            return Err(ValidationError::TermsNotAccepted.into());
        }
        let details = self.draft.details().ok_or(WizardError::Incomplete)?;

        tracing::info!(service = %details.service, date = %details.date, "Submitting booking");
        let latency = self.backend.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let booking = self.backend.submit(&details, self.clock.now())?;

        self.confirmed = Some(booking.clone());
        self.stored = match self.store.append_booking(&booking) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, "Failed to store confirmed booking: {e}");
                false
            }
        };
        if let Err(e) = self.store.clear_progress() {
            tracing::warn!("Failed to clear booking progress: {e}");
        }
        Ok(booking)
    }
}
