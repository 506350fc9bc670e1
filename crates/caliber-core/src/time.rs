//! Time source - wall-clock sampling and local time of day
//!
//! `TimeKeeper` reads a [`Clock`] once per frame, converts the instant to
//! the configured timezone and produces a [`TimeState`]. Every field of a
//! `TimeState` is normalized into range on construction, so the hand angle
//! functions never see an out-of-range minute or second.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::f64::consts::TAU;
use thiserror::Error;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Largest representable seconds value below 60
const MAX_SECONDS: f64 = 59.999_999_999;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Local time of day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TimeState {
    hours: u32,
    minutes: u32,
    seconds: f64,
    total_seconds: f64,
}

impl TimeState {
    /// Build from clock fields. Overflowing fields carry into the next unit
    /// and the result wraps at midnight.
    pub fn new(hours: u32, minutes: u32, seconds: f64) -> Self {
        Self::from_total_seconds(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
    }

    /// Build from seconds since local midnight, wrapped into [0, 86400)
    pub fn from_total_seconds(total: f64) -> Self {
        let mut total = if total.is_finite() {
            total.rem_euclid(SECONDS_PER_DAY)
        } else {
            0.0
        };
        if total >= SECONDS_PER_DAY {
            total = 0.0;
        }

        let whole = total.floor() as u32;
        let hours = whole / 3600;
        let minutes = (whole % 3600) / 60;
        let seconds = (total - (hours * 3600 + minutes * 60) as f64).clamp(0.0, MAX_SECONDS);

        Self {
            hours,
            minutes,
            seconds,
            total_seconds: hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Seconds within the minute, including the fractional part
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }

    /// Hour hand angle in radians; clockwise is negative
    pub fn hour_hand_angle(&self) -> f64 {
        let hours12 = (self.hours % 12) as f64;
        -((hours12 + self.minutes as f64 / 60.0) / 12.0) * TAU
    }

    pub fn minute_hand_angle(&self) -> f64 {
        -((self.minutes as f64 + self.seconds / 60.0) / 60.0) * TAU
    }

    /// Sweeping second hand: follows the fractional seconds
    pub fn second_hand_angle(&self) -> f64 {
        -(self.seconds / 60.0) * TAU
    }
}

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Samples a clock and converts to a local time of day
#[derive(Debug, Clone)]
pub struct TimeKeeper<C = SystemClock> {
    clock: C,
    timezone: Tz,
    state: TimeState,
    abbreviation: String,
}

impl TimeKeeper<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> TimeKeeper<C> {
    /// New keeper on Japan Standard Time, sampled once
    pub fn new(clock: C) -> Self {
        let mut keeper = Self {
            clock,
            timezone: chrono_tz::Asia::Tokyo,
            state: TimeState::default(),
            abbreviation: String::new(),
        };
        keeper.sample();
        keeper
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self.sample();
        self
    }

    /// Switch to an IANA timezone name such as "Europe/Paris"
    pub fn with_timezone_name(self, name: &str) -> Result<Self, TimeError> {
        let timezone: Tz = name
            .parse()
            .map_err(|_| TimeError::UnknownTimezone(name.to_string()))?;
        Ok(self.with_timezone(timezone))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Read the clock and recompute the local time of day
    pub fn sample(&mut self) -> TimeState {
        let local = self.clock.now().with_timezone(&self.timezone);
        // Leap seconds report nanos >= 1e9; normalization clamps them
        let fraction = local.nanosecond() as f64 / 1e9;
        self.state = TimeState::new(
            local.hour(),
            local.minute(),
            local.second() as f64 + fraction,
        );
        self.abbreviation = local.format("%Z").to_string();
        self.state
    }

    /// Most recent sample
    pub fn state(&self) -> TimeState {
        self.state
    }

    /// "HH:MM:SS TZ" of the most recent sample
    pub fn formatted(&self) -> String {
        format!(
            "{:02}:{:02}:{:02} {}",
            self.state.hours,
            self.state.minutes,
            self.state.seconds.floor() as u32,
            self.abbreviation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::f64::consts::PI;

    #[test]
    fn test_fields_and_total() {
        let t = TimeState::new(3, 15, 30.0);
        assert_eq!(t.hours(), 3);
        assert_eq!(t.minutes(), 15);
        assert_eq!(t.seconds(), 30.0);
        assert_eq!(t.total_seconds(), 11730.0);
    }

    #[test]
    fn test_hand_angles() {
        let t = TimeState::new(3, 15, 30.0);
        assert!((t.hour_hand_angle() - -1.7017).abs() < 1e-3);
        assert!((t.minute_hand_angle() - -1.6232).abs() < 1e-3);
        assert!((t.second_hand_angle() + PI).abs() < 1e-12);

        // 15:00 reads the same as 03:00 on the hour hand
        let afternoon = TimeState::new(15, 15, 30.0);
        assert_eq!(afternoon.hour_hand_angle(), t.hour_hand_angle());
    }

    #[test]
    fn test_normalization() {
        let carried = TimeState::new(0, 59, 75.5);
        assert_eq!(carried.hours(), 1);
        assert_eq!(carried.minutes(), 0);
        assert!((carried.seconds() - 15.5).abs() < 1e-9);

        let wrapped = TimeState::from_total_seconds(SECONDS_PER_DAY + 5.0);
        assert_eq!(wrapped.total_seconds(), 5.0);

        let negative = TimeState::from_total_seconds(-1.0);
        assert_eq!(negative.hours(), 23);
        assert_eq!(negative.minutes(), 59);

        assert_eq!(TimeState::from_total_seconds(f64::NAN), TimeState::default());
        assert_eq!(TimeState::new(24, 0, 0.0).total_seconds(), 0.0);
    }

    #[test]
    fn test_seconds_stay_below_sixty() {
        for total in [59.999_999_999_9, 3599.999_999_999, 86_399.999_999_999_9] {
            let t = TimeState::from_total_seconds(total);
            assert!(t.seconds() < 60.0);
            assert!(t.minutes() < 60);
            assert!(t.hours() < 24);
            assert!(t.total_seconds() < SECONDS_PER_DAY);
        }
    }

    #[test]
    fn test_tokyo_conversion() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 15).unwrap();
        let mut keeper = TimeKeeper::new(FixedClock::new(utc));
        let state = keeper.sample();
        assert_eq!(state.hours(), 3);
        assert_eq!(state.minutes(), 30);
        assert_eq!(state.seconds(), 15.0);
        assert_eq!(keeper.formatted(), "03:30:15 JST");
    }

    #[test]
    fn test_fractional_seconds_and_advance() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut keeper = TimeKeeper::new(FixedClock::new(utc));
        keeper.clock_mut().advance(Duration::milliseconds(1250));
        let state = keeper.sample();
        assert!((state.seconds() - 1.25).abs() < 1e-9);
        assert_eq!(keeper.state(), state);
    }

    #[test]
    fn test_timezone_by_name() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let keeper = TimeKeeper::new(FixedClock::new(utc))
            .with_timezone_name("UTC")
            .unwrap();
        assert_eq!(keeper.state().hours(), 12);

        let err = TimeKeeper::new(FixedClock::new(utc))
            .with_timezone_name("Mars/Olympus_Mons")
            .unwrap_err();
        assert_eq!(err, TimeError::UnknownTimezone("Mars/Olympus_Mons".into()));
    }
}
