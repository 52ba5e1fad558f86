use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Lightspeed";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hospital identity used in exports and calendar events.
pub const HOSPITAL_NAME: &str = "Lightspeed Hospital";
pub const HOSPITAL_ADDRESS: &str = "Lightspeed Hospital, 123 Medical Center Drive";
pub const HOSPITAL_DOMAIN: &str = "lightspeed-hospital.com";

/// Get the application data directory.
/// Falls back to the working directory when the platform has no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Per-browser key-value storage database.
pub fn storage_path() -> PathBuf {
    app_data_dir().join("local_storage.db")
}

/// Printable summaries land here.
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

/// Optional JSON override for [`BookingConfig`].
pub fn booking_config_path() -> PathBuf {
    app_data_dir().join("booking.json")
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "lightspeed_lib=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ═══════════════════════════════════════════════════════════
// Booking rules
// ═══════════════════════════════════════════════════════════

/// Tunables for the booking wizard and its simulators.
///
/// Every field has a default so a partial JSON file only overrides
/// what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Earliest bookable day, counted from today.
    pub min_booking_days: i64,
    /// Latest bookable day, counted from today.
    pub max_booking_days: i64,
    /// First slot hour (inclusive).
    pub opening_hour: u32,
    /// Closing hour (exclusive).
    pub closing_hour: u32,
    pub slot_minutes: u32,
    /// Bookable weekdays (calendar widget allows Monday to Saturday).
    pub working_days: Vec<Weekday>,
    /// Probability that a generated slot is free.
    pub availability_ratio: f64,
    /// Probability that a simulated submission succeeds.
    pub success_rate: f64,
    pub slot_load_delay_ms: u64,
    pub submit_delay_ms: u64,
    /// Progress snapshots older than this are discarded on resume.
    pub resume_window_minutes: i64,
    /// Calendar alarm lead time.
    pub reminder_minutes: i64,
    /// Offset of the hospital's wall clock. `None` uses the system time zone,
    /// including its daylight-saving rules.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            min_booking_days: 1,
            max_booking_days: 90,
            opening_hour: 8,
            closing_hour: 18,
            slot_minutes: 30,
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
            ],
            availability_ratio: 0.7,
            success_rate: 0.95,
            slot_load_delay_ms: 1000,
            submit_delay_ms: 2000,
            resume_window_minutes: 60,
            reminder_minutes: 15,
            utc_offset_minutes: None,
        }
    }
}

impl BookingConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Booking config not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded booking config");
        Ok(config)
    }

    /// Reject values that would make the wizard unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_booking_days > self.max_booking_days {
            return Err(ConfigError::Invalid {
                field: "min_booking_days",
                reason: format!(
                    "{} is after max_booking_days {}",
                    self.min_booking_days, self.max_booking_days
                ),
            });
        }
        if self.opening_hour >= self.closing_hour || self.closing_hour > 24 {
            return Err(ConfigError::Invalid {
                field: "closing_hour",
                reason: format!("{}..{} is not a valid day", self.opening_hour, self.closing_hour),
            });
        }
        if self.slot_minutes == 0 || 60 % self.slot_minutes != 0 {
            return Err(ConfigError::Invalid {
                field: "slot_minutes",
                reason: format!("{} does not divide an hour", self.slot_minutes),
            });
        }
        for (field, p) in [
            ("availability_ratio", self.availability_ratio),
            ("success_rate", self.success_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{p} is not a probability"),
                });
            }
        }
        Ok(())
    }

    pub fn working_hours(&self) -> Range<u32> {
        self.opening_hour..self.closing_hour
    }

    pub fn slot_load_delay(&self) -> Duration {
        Duration::from_millis(self.slot_load_delay_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
    }

    /// Place a hospital wall-clock time in UTC.
    ///
    /// Without a fixed offset the system zone is asked for the offset in
    /// force on that date. A time skipped by a DST jump yields `None`; an
    /// ambiguous one resolves to the earlier instant.
    pub fn to_utc(&self, wall_clock: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.fixed_offset() {
            Some(offset) => offset
                .from_local_datetime(&wall_clock)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
            None => Local
                .from_local_datetime(&wall_clock)
                .earliest()
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Config with zero artificial latency, for tests and headless hosts.
    pub fn instant() -> Self {
        Self {
            slot_load_delay_ms: 0,
            submit_delay_ms: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with(APP_NAME));
    }

    #[test]
    fn storage_and_exports_under_app_data() {
        let app = app_data_dir();
        assert!(storage_path().starts_with(&app));
        assert!(exports_dir().starts_with(&app));
        assert!(exports_dir().ends_with("exports"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn defaults_match_working_hours() {
        let config = BookingConfig::default();
        assert_eq!(config.working_hours(), 8..18);
        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.working_days.len(), 6);
        assert!(!config.working_days.contains(&Weekday::Sun));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BookingConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, BookingConfig::default());
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booking.json");
        std::fs::write(&path, r#"{"max_booking_days": 30, "success_rate": 1.0}"#).unwrap();

        let config = BookingConfig::load(&path).unwrap();
        assert_eq!(config.max_booking_days, 30);
        assert_eq!(config.success_rate, 1.0);
        assert_eq!(config.min_booking_days, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booking.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = BookingConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let config = BookingConfig {
            availability_ratio: 1.5,
            ..BookingConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "availability_ratio", .. }));
    }

    #[test]
    fn fixed_offset_honoured() {
        let config = BookingConfig {
            utc_offset_minutes: Some(-300),
            ..BookingConfig::default()
        };
        assert_eq!(config.fixed_offset().map(|o| o.local_minus_utc()), Some(-300 * 60));
        let wall = NaiveDate::from_ymd_opt(2026, 12, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            config.to_utc(wall),
            Some(Utc.with_ymd_and_hms(2026, 12, 1, 14, 0, 0).unwrap())
        );
    }

    #[test]
    fn system_zone_follows_daylight_saving() {
        // Only this test touches TZ; chrono re-reads it per thread.
        std::env::set_var("TZ", "EST5EDT,M3.2.0,M11.1.0");
        let config = BookingConfig::default();
        let at_nine = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        };

        assert_eq!(
            config.to_utc(at_nine(2026, 7, 1)),
            Some(Utc.with_ymd_and_hms(2026, 7, 1, 13, 0, 0).unwrap())
        );
        assert_eq!(
            config.to_utc(at_nine(2026, 12, 1)),
            Some(Utc.with_ymd_and_hms(2026, 12, 1, 14, 0, 0).unwrap())
        );
        // 02:30 on the spring-forward day does not exist
        let skipped = NaiveDate::from_ymd_opt(2026, 3, 8)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(config.to_utc(skipped), None);
    }

    #[test]
    fn instant_config_has_no_latency() {
        let config = BookingConfig::instant();
        assert_eq!(config.slot_load_delay(), Duration::ZERO);
        assert_eq!(config.submit_delay(), Duration::ZERO);
    }
}
