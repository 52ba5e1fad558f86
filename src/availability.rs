//! Simulated appointment slot availability.
//!
//! Slots are generated fresh on every call: there is no record of what
//! has been booked, so asking twice for the same date gives different
//! answers. This is a stand-in for a real scheduling service.

use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::BookingConfig;
use crate::models::SlotPeriod;

/// One bookable interval on the day grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// `HH:MM`, also the slot's identifier.
    pub time: String,
    pub available: bool,
    pub period: SlotPeriod,
}

/// Source of the slot grid for a date.
pub trait AvailabilitySource: Send + Sync {
    fn slots_for(&self, date: NaiveDate) -> Vec<TimeSlot>;

    /// Artificial latency the caller should wait before showing slots.
    fn latency(&self) -> Duration {
        Duration::ZERO
    }
}

/// Build the working-day grid, asking `is_available` for each slot.
pub fn build_slot_grid(
    config: &BookingConfig,
    mut is_available: impl FnMut(u32, u32) -> bool,
) -> Vec<TimeSlot> {
    let step = config.slot_minutes.max(1) as usize;
    let mut slots = Vec::new();
    for hour in config.working_hours() {
        for minute in (0..60).step_by(step) {
            slots.push(TimeSlot {
                time: format!("{hour:02}:{minute:02}"),
                available: is_available(hour, minute),
                period: SlotPeriod::from_hour(hour),
            });
        }
    }
    slots
}

/// Generate one day's slots with independent coin flips.
pub fn generate_slots<R: Rng>(
    _date: NaiveDate,
    config: &BookingConfig,
    rng: &mut R,
) -> Vec<TimeSlot> {
    let ratio = config.availability_ratio;
    build_slot_grid(config, |_, _| rng.gen_bool(ratio))
}

/// Random availability with a configurable free-slot ratio.
pub struct RandomAvailability {
    config: BookingConfig,
    rng: Mutex<StdRng>,
}

impl RandomAvailability {
    pub fn new(config: BookingConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence, for tests and demos.
    pub fn seeded(config: BookingConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AvailabilitySource for RandomAvailability {
    fn slots_for(&self, date: NaiveDate) -> Vec<TimeSlot> {
        // A poisoned generator still has valid state
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        let slots = generate_slots(date, &self.config, &mut *rng);
        tracing::debug!(
            %date,
            free = slots.iter().filter(|s| s.available).count(),
            total = slots.len(),
            "Generated slot grid"
        );
        slots
    }

    fn latency(&self) -> Duration {
        self.config.slot_load_delay()
    }
}

/// Group slots by period, preserving order, skipping empty periods.
pub fn group_by_period(slots: &[TimeSlot]) -> Vec<(SlotPeriod, Vec<&TimeSlot>)> {
    [
        SlotPeriod::Morning,
        SlotPeriod::Midday,
        SlotPeriod::Afternoon,
        SlotPeriod::Evening,
    ]
    .into_iter()
    .map(|p| (p, slots.iter().filter(|s| s.period == p).collect::<Vec<_>>()))
    .filter(|(_, group)| !group.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn twenty_slots_per_day() {
        let config = BookingConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        for offset in 0..30 {
            let date = monday() + chrono::Duration::days(offset);
            assert_eq!(generate_slots(date, &config, &mut rng).len(), 20);
        }
    }

    #[test]
    fn slots_are_ordered_half_hours() {
        let config = BookingConfig::default();
        let slots = generate_slots(monday(), &config, &mut StdRng::seed_from_u64(7));
        assert_eq!(slots.first().unwrap().time, "08:00");
        assert_eq!(slots[1].time, "08:30");
        assert_eq!(slots.last().unwrap().time, "17:30");
        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);
    }

    #[test]
    fn period_matches_hour() {
        let config = BookingConfig::default();
        let slots = generate_slots(monday(), &config, &mut StdRng::seed_from_u64(3));
        for slot in &slots {
            let hour: u32 = slot.time[..2].parse().unwrap();
            assert_eq!(slot.period, SlotPeriod::from_hour(hour), "slot {}", slot.time);
        }
        assert_eq!(slots[0].period, SlotPeriod::Morning);
        assert_eq!(slots[19].period, SlotPeriod::Evening);
    }

    #[test]
    fn ratio_extremes() {
        let all_free = BookingConfig {
            availability_ratio: 1.0,
            ..BookingConfig::default()
        };
        let none_free = BookingConfig {
            availability_ratio: 0.0,
            ..BookingConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        assert!(generate_slots(monday(), &all_free, &mut rng).iter().all(|s| s.available));
        assert!(generate_slots(monday(), &none_free, &mut rng).iter().all(|s| !s.available));
    }

    #[test]
    fn roughly_seventy_percent_free() {
        let config = BookingConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut free = 0;
        let mut total = 0;
        for _ in 0..500 {
            let slots = generate_slots(monday(), &config, &mut rng);
            free += slots.iter().filter(|s| s.available).count();
            total += slots.len();
        }
        let ratio = free as f64 / total as f64;
        assert!((0.65..0.75).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn no_memory_between_calls() {
        let source = RandomAvailability::seeded(BookingConfig::default(), 5);
        let runs: Vec<Vec<TimeSlot>> = (0..5).map(|_| source.slots_for(monday())).collect();
        assert!(runs.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn seeded_sources_agree() {
        let a = RandomAvailability::seeded(BookingConfig::default(), 11);
        let b = RandomAvailability::seeded(BookingConfig::default(), 11);
        assert_eq!(a.slots_for(monday()), b.slots_for(monday()));
    }

    #[test]
    fn latency_follows_config() {
        let source = RandomAvailability::new(BookingConfig::instant());
        assert_eq!(source.latency(), Duration::ZERO);
        let source = RandomAvailability::new(BookingConfig::default());
        assert_eq!(source.latency(), Duration::from_millis(1000));
    }

    #[test]
    fn grouping_keeps_all_slots() {
        let config = BookingConfig::default();
        let slots = build_slot_grid(&config, |_, _| true);
        let groups = group_by_period(&slots);
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].1.len(), 4); // 08:00..09:30
        assert_eq!(groups[1].1.len(), 8); // 10:00..13:30
        assert_eq!(groups[2].1.len(), 6); // 14:00..16:30
        assert_eq!(groups[3].1.len(), 2); // 17:00, 17:30
    }
}
