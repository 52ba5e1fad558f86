pub mod catalog;
pub mod export;
pub mod wizard;

use serde::Serialize;

use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::models::NotificationKind;
use crate::validation::{Field, ValidationError};
use crate::wizard::WizardError;

/// Shown for faults the user cannot correct.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong. Please reload the page and try again.";

/// Transient banner for the view layer.
///
/// Validation failures also name the offending field so the view can
/// mark it inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub field: Option<Field>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            field: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
            field: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            field: None,
        }
    }

    pub fn generic() -> Self {
        Self::error(GENERIC_ERROR_MESSAGE)
    }
}

impl From<CoreError> for Notification {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Wizard(e) => e.into(),
            CoreError::SubmissionInProgress => {
                Notification::info("Your booking is being submitted. Please wait.")
            }
            CoreError::NoConfirmedBooking | CoreError::Database(DatabaseError::NotFound { .. }) => {
                Notification::error(e.to_string())
            }
            other => {
                tracing::error!("Unexpected fault: {other}");
                Notification::generic()
            }
        }
    }
}

impl From<ValidationError> for Notification {
    fn from(e: ValidationError) -> Self {
        Notification {
            kind: NotificationKind::Error,
            message: e.to_string(),
            field: Some(e.field()),
        }
    }
}

impl From<WizardError> for Notification {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::Validation(v) => v.into(),
            WizardError::Submission(s) => Notification::error(s.to_string()),
            WizardError::AlreadyConfirmed => Notification::info(e.to_string()),
            WizardError::NotAtReview | WizardError::Incomplete => Notification::error(e.to_string()),
            WizardError::Storage(db) => {
                tracing::error!("Storage fault: {db}");
                Notification::generic()
            }
        }
    }
}
