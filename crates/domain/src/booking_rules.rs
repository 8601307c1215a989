//! Pure pre-validation and chain-length math backing the Booking
//! Transactor (C5). `validate_booking_rules` (lead time, duplicate
//! pending) runs outside the transaction per the component design;
//! `slots_needed` is the `ceil(required_minutes / slot_length)` used to
//! size the lock-chain in step 6.

use chrono::NaiveDate;
use shared::errors::DomainError;

/// A reservation's first slot must start strictly after
/// `today + booking_lead_time_days` in the business time zone.
pub fn check_lead_time(
    slot_local_date: NaiveDate,
    today_local_date: NaiveDate,
    lead_time_days: i64,
) -> Result<(), DomainError> {
    let days_ahead = (slot_local_date - today_local_date).num_days();
    if days_ahead < lead_time_days {
        return Err(DomainError::LeadTimeViolation);
    }
    Ok(())
}

/// `ceil(required_minutes / slot_length_minutes)`, minimum 1. Errors if
/// the slot length is non-positive (the initial slot has zero or negative
/// duration — `SLOT_ZERO_DURATION`).
pub fn slots_needed(required_minutes: i32, slot_length_minutes: i32) -> Result<u32, DomainError> {
    if slot_length_minutes <= 0 {
        return Err(DomainError::SlotZeroDuration);
    }
    let needed = (required_minutes as f64 / slot_length_minutes as f64).ceil() as i64;
    Ok(needed.max(1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lead_time_rejects_today_and_past() {
        let today = date(2024, 6, 18);
        assert!(check_lead_time(today, today, 1).is_err());
        assert!(check_lead_time(date(2024, 6, 17), today, 1).is_err());
    }

    #[test]
    fn lead_time_accepts_next_day() {
        let today = date(2024, 6, 18);
        assert!(check_lead_time(date(2024, 6, 19), today, 1).is_ok());
    }

    #[test]
    fn slots_needed_rounds_up() {
        assert_eq!(slots_needed(60, 60).unwrap(), 1);
        assert_eq!(slots_needed(90, 60).unwrap(), 2);
        assert_eq!(slots_needed(120, 60).unwrap(), 2);
        assert_eq!(slots_needed(121, 60).unwrap(), 3);
    }

    #[test]
    fn slots_needed_minimum_one() {
        assert_eq!(slots_needed(0, 60).unwrap(), 1);
    }

    #[test]
    fn zero_slot_length_is_an_error() {
        assert!(slots_needed(60, 0).is_err());
    }
}
