//! Shared application state behind the command layer.
//!
//! One `CoreState` per running app. The wizard is the only mutable
//! session state and sits behind an async mutex; submissions are
//! additionally gated by an in-flight flag so a repeated click is
//! rejected immediately instead of queueing behind the first attempt.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{self, BookingConfig, ConfigError};
use crate::db::{DatabaseError, SqliteStore};
use crate::export::ExportError;
use crate::models::ConfirmedBooking;
use crate::persistence::BookingStore;
use crate::wizard::{BookingWizard, WizardError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    wizard: tokio::sync::Mutex<BookingWizard>,
    /// Set while a submission is awaiting the backend.
    submitting: AtomicBool,
    store: BookingStore,
    config: BookingConfig,
    pub exports_dir: PathBuf,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CoreState {
    pub fn new(wizard: BookingWizard, exports_dir: PathBuf) -> Self {
        Self {
            store: wizard.store().clone(),
            config: wizard.config().clone(),
            wizard: tokio::sync::Mutex::new(wizard),
            submitting: AtomicBool::new(false),
            exports_dir,
        }
    }

    /// State over the on-disk store, the config file and the simulators.
    pub fn open_default() -> Result<Self, CoreError> {
        let booking_config = BookingConfig::load(&config::booking_config_path())?;
        let store = SqliteStore::open(&config::storage_path())?;
        let wizard = BookingWizard::simulated(booking_config, BookingStore::new(Arc::new(store)));
        tracing::info!(version = config::APP_VERSION, "Core state ready");
        Ok(Self::new(wizard, config::exports_dir()))
    }

    pub async fn wizard(&self) -> tokio::sync::MutexGuard<'_, BookingWizard> {
        self.wizard.lock().await
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Submit the wizard's draft, suppressing duplicates while in flight.
    pub async fn submit(&self) -> Result<ConfirmedBooking, CoreError> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Duplicate submission suppressed");
            return Err(CoreError::SubmissionInProgress);
        }
        let _guard = SubmitGuard(&self.submitting);

        let mut wizard = self.wizard.lock().await;
        Ok(wizard.submit().await?)
    }

    /// A confirmed booking by id, or the one just confirmed when `id` is `None`.
    pub async fn booking(&self, id: Option<&str>) -> Result<ConfirmedBooking, CoreError> {
        match id {
            Some(id) => Ok(self.store.find_booking(id)?),
            None => self
                .wizard
                .lock()
                .await
                .confirmed()
                .cloned()
                .ok_or(CoreError::NoConfirmedBooking),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("A booking is already being submitted")]
    SubmissionInProgress,
    #[error("No confirmed booking to export")]
    NoConfirmedBooking,
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
