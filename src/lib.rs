pub mod availability;
pub mod booking;
pub mod catalog;
pub mod clock;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod db;
pub mod export;
pub mod models;
pub mod persistence;
pub mod validation;
pub mod wizard;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::core_state::{CoreError, CoreState};

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Start the booking backend for a view shell to drive through `commands`.
pub fn run() -> Result<Arc<CoreState>, CoreError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    Ok(Arc::new(CoreState::open_default()?))
}
