use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Duration in minutes (for service durations, travel times, buffers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct DurationMinutes(i32);

impl DurationMinutes {
    pub fn new(minutes: i32) -> Self {
        Self(minutes.max(0))
    }

    pub fn as_minutes(&self) -> i32 {
        self.0
    }

    pub fn as_chrono_duration(&self) -> Duration {
        Duration::minutes(self.0 as i64)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for DurationMinutes {
    fn from(minutes: i32) -> Self {
        Self::new(minutes)
    }
}

impl fmt::Display for DurationMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 60 {
            let hours = self.0 / 60;
            let mins = self.0 % 60;
            if mins == 0 {
                write!(f, "{}h", hours)
            } else {
                write!(f, "{}h {}m", hours, mins)
            }
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

/// A time slot with start and end times in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Create a new time slot, validating that end is after start
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeSlotError> {
        if end <= start {
            return Err(TimeSlotError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a time slot from a start time and duration
    pub fn from_start_and_duration(start: DateTime<Utc>, duration: DurationMinutes) -> Self {
        Self {
            start,
            end: start + duration.as_chrono_duration(),
        }
    }

    /// Get the duration of this time slot in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Check if this time slot overlaps with another
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this time slot contains a specific instant
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Check if this time slot fully contains another
    pub fn contains_slot(&self, other: &TimeSlot) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Get the gap between this slot and another (if this ends before other starts)
    pub fn gap_to(&self, other: &TimeSlot) -> Option<TimeSlot> {
        if self.end <= other.start {
            Some(TimeSlot {
                start: self.end,
                end: other.start,
            })
        } else {
            None
        }
    }

    /// Extend the start time backwards by the given duration
    pub fn extend_start(&self, duration: DurationMinutes) -> Self {
        Self {
            start: self.start - duration.as_chrono_duration(),
            end: self.end,
        }
    }

    /// Extend the end time forwards by the given duration
    pub fn extend_end(&self, duration: DurationMinutes) -> Self {
        Self {
            start: self.start,
            end: self.end + duration.as_chrono_duration(),
        }
    }
}

/// Check that a start-ordered sequence of slots forms one contiguous run:
/// each slot's end must equal the next slot's start exactly. An empty or
/// single-element sequence is trivially contiguous.
pub fn is_contiguous_run(slots: &[TimeSlot]) -> bool {
    slots.windows(2).all(|pair| pair[0].end == pair[1].start)
}

/// Convert a UTC instant into the configured business time zone and format
/// it as `HH:MM`, the representation `ServiceTimeRule.allowed_start_times`
/// is expressed in.
pub fn local_hhmm(instant: DateTime<Utc>, business_tz: Tz) -> String {
    instant.with_timezone(&business_tz).format("%H:%M").to_string()
}

/// Weekday as `0 = Monday .. 6 = Sunday` in the configured business time
/// zone, matching the convention used by `WorkSchedule`/`ServiceTimeRule`.
pub fn local_weekday(instant: DateTime<Utc>, business_tz: Tz) -> u8 {
    instant
        .with_timezone(&business_tz)
        .weekday()
        .num_days_from_monday() as u8
}

/// Build a `DateTime<Utc>` for a given local calendar date and naive time in
/// the business time zone, resolving DST ambiguity by taking the earliest
/// valid instant.
pub fn local_datetime(
    date: chrono::NaiveDate,
    time: NaiveTime,
    business_tz: Tz,
) -> Option<DateTime<Utc>> {
    business_tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Error for invalid time slot creation
#[derive(Debug, Clone, thiserror::Error)]
pub enum TimeSlotError {
    #[error("End time ({end}) must be after start time ({start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Working hours for a specific day of the week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    /// Day of week (0 = Monday .. 6 = Sunday), matching `local_weekday`.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

impl WorkingHours {
    pub fn new(day_of_week: u8, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
            is_active: true,
        }
    }

    /// Get the duration of working hours in minutes
    pub fn duration_minutes(&self) -> i64 {
        let duration = self.end_time.signed_duration_since(self.start_time);
        duration.num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration_minutes() {
        let d = DurationMinutes::new(90);
        assert_eq!(d.as_minutes(), 90);
        assert_eq!(d.to_string(), "1h 30m");

        let d2 = DurationMinutes::new(30);
        assert_eq!(d2.to_string(), "30m");

        let d3 = DurationMinutes::new(120);
        assert_eq!(d3.to_string(), "2h");
    }

    #[test]
    fn test_duration_negative_clamped() {
        let d = DurationMinutes::new(-10);
        assert_eq!(d.as_minutes(), 0);
    }

    #[test]
    fn test_time_slot_creation() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap();
        let slot = TimeSlot::new(start, end).unwrap();
        assert_eq!(slot.duration_minutes(), 60);
    }

    #[test]
    fn test_time_slot_invalid() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        assert!(TimeSlot::new(start, end).is_err());
    }

    #[test]
    fn test_time_slot_overlaps() {
        let slot1 = TimeSlot::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap(),
        )
        .unwrap();

        let slot2 = TimeSlot::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 11, 30, 0).unwrap(),
        )
        .unwrap();

        let slot3 = TimeSlot::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        )
        .unwrap();

        assert!(slot1.overlaps(&slot2)); // Overlapping
        assert!(!slot1.overlaps(&slot3)); // Adjacent, not overlapping
    }

    #[test]
    fn test_time_slot_gap() {
        let slot1 = TimeSlot::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap(),
        )
        .unwrap();

        let slot2 = TimeSlot::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 0).unwrap(),
        )
        .unwrap();

        let gap = slot1.gap_to(&slot2).unwrap();
        assert_eq!(gap.duration_minutes(), 60);
    }

    #[test]
    fn test_is_contiguous_run() {
        let s = |h1: u32, h2: u32| {
            TimeSlot::new(
                Utc.with_ymd_and_hms(2024, 6, 15, h1, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 15, h2, 0, 0).unwrap(),
            )
            .unwrap()
        };
        assert!(is_contiguous_run(&[s(9, 10), s(10, 11), s(11, 12)]));
        assert!(!is_contiguous_run(&[s(9, 10), s(11, 12)]));
        assert!(is_contiguous_run(&[]));
        assert!(is_contiguous_run(&[s(9, 10)]));
    }

    #[test]
    fn test_local_hhmm() {
        let tz: Tz = "America/Santiago".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 6, 18, 14, 0, 0).unwrap();
        let hhmm = local_hhmm(instant, tz);
        assert_eq!(hhmm, "10:00");
    }

    #[test]
    fn test_local_weekday_monday() {
        let tz: Tz = "America/Santiago".parse().unwrap();
        // 2024-06-18 is a Tuesday in Santiago.
        let instant = Utc.with_ymd_and_hms(2024, 6, 18, 14, 0, 0).unwrap();
        assert_eq!(local_weekday(instant, tz), 1);
    }
}
