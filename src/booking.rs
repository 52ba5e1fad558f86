//! Booking submission: backend seam and the simulated backend.
//!
//! The simulator stands in for a network round trip. It succeeds with a
//! configured probability, and on success stamps the booking with a
//! fresh `APT-<timestamp>-<suffix>` identifier. No idempotency key is
//! sent, so a retry after a failure is an independent attempt.

use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use thiserror::Error;

use crate::config::BookingConfig;
use crate::models::{BookingDetails, BookingStatus, ConfirmedBooking};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_SUFFIX_LEN: usize = 9;

static BOOKING_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^APT-[0-9A-Z]+-[0-9A-Z]{9}$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("We couldn't complete your booking. Please try again.")]
    Transient,
}

/// Accepts a complete booking and decides its fate.
pub trait BookingBackend: Send + Sync {
    fn submit(
        &self,
        details: &BookingDetails,
        now: DateTime<Utc>,
    ) -> Result<ConfirmedBooking, SubmissionError>;

    /// Artificial latency the caller should wait before submitting.
    fn latency(&self) -> Duration {
        Duration::ZERO
    }
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// `APT-<base36 epoch millis>-<9 random base36 chars>`.
pub fn generate_booking_id<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect();
    format!("APT-{}-{}", to_base36(millis), suffix)
}

pub fn is_well_formed_booking_id(id: &str) -> bool {
    BOOKING_ID_PATTERN.is_match(id)
}

/// Randomized backend with a fixed success rate.
pub struct SimulatedBackend {
    success_rate: f64,
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedBackend {
    pub fn new(config: &BookingConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible outcomes, for tests and demos.
    pub fn seeded(config: &BookingConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &BookingConfig, rng: StdRng) -> Self {
        Self {
            success_rate: config.success_rate,
            delay: config.submit_delay(),
            rng: Mutex::new(rng),
        }
    }
}

impl BookingBackend for SimulatedBackend {
    fn submit(
        &self,
        details: &BookingDetails,
        now: DateTime<Utc>,
    ) -> Result<ConfirmedBooking, SubmissionError> {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        if !rng.gen_bool(self.success_rate) {
            tracing::warn!(service = %details.service, "Simulated booking failure");
            return Err(SubmissionError::Transient);
        }

        let booking = ConfirmedBooking {
            id: generate_booking_id(now, &mut *rng),
            status: BookingStatus::Confirmed,
            created_at: now,
            details: details.clone(),
        };
        tracing::info!(booking_id = %booking.id, service = %details.service, "Booking confirmed");
        Ok(booking)
    }

    fn latency(&self) -> Duration {
        self.delay
    }
}
