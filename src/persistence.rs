//! Typed collections on top of [`KeyValueStore`].
//!
//! Four independent keys, each holding one JSON document:
//! - `appointments`: append-only list of confirmed bookings
//! - `appointmentProgress`: latest wizard snapshot for resume
//! - `userPreferences`: last catalog filter and search term
//! - `serviceRatings`: user ratings per service
//!
//! Every mutation reads the whole value, changes it in memory and writes
//! it back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::db::{DatabaseError, KeyValueStore};
use crate::models::{ConfirmedBooking, ProgressSnapshot};

pub const BOOKINGS_KEY: &str = "appointments";
pub const PROGRESS_KEY: &str = "appointmentProgress";
pub const PREFERENCES_KEY: &str = "userPreferences";
pub const RATINGS_KEY: &str = "serviceRatings";

/// Catalog view state remembered between visits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogPreferences {
    pub last_filter: String,
    pub last_search: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct BookingStore {
    store: Arc<dyn KeyValueStore>,
}

impl BookingStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.store.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_item(key, &raw)
    }

    // ── Confirmed bookings ──────────────────────────────────

    pub fn load_bookings(&self) -> Result<Vec<ConfirmedBooking>, DatabaseError> {
        Ok(self.read(BOOKINGS_KEY)?.unwrap_or_default())
    }

    pub fn append_booking(&self, booking: &ConfirmedBooking) -> Result<(), DatabaseError> {
        let mut bookings = self.load_bookings()?;
        bookings.push(booking.clone());
        self.write(BOOKINGS_KEY, &bookings)?;
        tracing::info!(booking_id = %booking.id, total = bookings.len(), "Booking stored");
        Ok(())
    }

    pub fn find_booking(&self, id: &str) -> Result<ConfirmedBooking, DatabaseError> {
        self.load_bookings()?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| DatabaseError::NotFound {
                entity_type: "booking".into(),
                id: id.into(),
            })
    }

    // ── Progress snapshot ───────────────────────────────────

    pub fn save_progress(&self, snapshot: &ProgressSnapshot) -> Result<(), DatabaseError> {
        self.write(PROGRESS_KEY, snapshot)?;
        tracing::debug!(step = snapshot.step, "Progress snapshot saved");
        Ok(())
    }

    /// Load the snapshot if it is younger than `max_age`.
    ///
    /// Stale or unreadable snapshots are removed and reported as absent.
    pub fn load_progress(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<Option<ProgressSnapshot>, DatabaseError> {
        let snapshot: ProgressSnapshot = match self.read(PROGRESS_KEY) {
            Ok(Some(s)) => s,
            Ok(None) => return Ok(None),
            Err(DatabaseError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable progress snapshot: {e}");
                self.clear_progress()?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let age = now.signed_duration_since(snapshot.saved_at);
        if age >= max_age {
            tracing::info!(
                age_minutes = age.num_minutes(),
                "Discarding stale progress snapshot"
            );
            self.clear_progress()?;
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    pub fn clear_progress(&self) -> Result<(), DatabaseError> {
        self.store.remove_item(PROGRESS_KEY)
    }

    // ── Catalog preferences ─────────────────────────────────

    pub fn load_preferences(&self) -> Result<CatalogPreferences, DatabaseError> {
        Ok(self.read(PREFERENCES_KEY)?.unwrap_or_default())
    }

    pub fn save_preferences(&self, prefs: &CatalogPreferences) -> Result<(), DatabaseError> {
        self.write(PREFERENCES_KEY, prefs)
    }

    // ── Service ratings ─────────────────────────────────────

    pub fn load_ratings(&self) -> Result<HashMap<String, Vec<u8>>, DatabaseError> {
        Ok(self.read(RATINGS_KEY)?.unwrap_or_default())
    }

    /// Record a rating and return the service's new average.
    pub fn add_rating(&self, service_id: &str, rating: u8) -> Result<f64, DatabaseError> {
        let mut ratings = self.load_ratings()?;
        let entry = ratings.entry(service_id.to_string()).or_default();
        entry.push(rating);
        let avg = average(entry);
        self.write(RATINGS_KEY, &ratings)?;
        Ok(avg)
    }

    pub fn average_rating(&self, service_id: &str) -> Result<Option<f64>, DatabaseError> {
        Ok(self
            .load_ratings()?
            .get(service_id)
            .filter(|r| !r.is_empty())
            .map(|r| average(r)))
    }
}

fn average(ratings: &[u8]) -> f64 {
    let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    f64::from(sum) / ratings.len() as f64
}
