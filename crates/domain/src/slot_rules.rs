//! Pure interval math backing the slot generator (C3): enumerating raw
//! candidate slots within a working window and filtering them against a
//! union of busy intervals (breaks, exceptions, blocks). No I/O; the
//! caller (`db::slot_generator`) fetches the inputs and persists the
//! outputs.

use shared::types::TimeSlot;

/// Enumerate fixed-length candidate slots tiling `window` exactly:
/// `current := window.start`; while `current + slot_length <= window.end`,
/// emit `[current, current + slot_length)`; advance by `slot_length`.
/// Unlike a travel-time engine's overlapping-interval slots, consecutive
/// slots here tile the window with no gaps, which is what makes chain
/// continuity in C5 a simple `end == next.start` check.
pub fn generate_raw_slots(window: TimeSlot, slot_length_minutes: i32) -> Vec<TimeSlot> {
    if slot_length_minutes <= 0 {
        return Vec::new();
    }
    let length = chrono::Duration::minutes(slot_length_minutes as i64);
    let mut slots = Vec::new();
    let mut current = window.start;
    while current + length <= window.end {
        // TimeSlot::new only fails when end <= start, which cannot happen
        // here since length > 0.
        slots.push(TimeSlot::new(current, current + length).expect("positive slot length"));
        current += length;
    }
    slots
}

/// A raw slot survives iff no busy interval overlaps it (half-open overlap).
pub fn filter_available(raw: &[TimeSlot], busy: &[TimeSlot]) -> Vec<TimeSlot> {
    raw.iter()
        .copied()
        .filter(|slot| !busy.iter().any(|b| slot.overlaps(b)))
        .collect()
}

/// Merge a set of (possibly overlapping or adjacent) intervals into their
/// minimal covering set, sorted by start. Used to collapse breaks +
/// exceptions + blocks into one busy-interval list before filtering.
pub fn merge_intervals(mut intervals: Vec<TimeSlot>) -> Vec<TimeSlot> {
    if intervals.is_empty() {
        return Vec::new();
    }
    intervals.sort_by_key(|s| s.start);
    let mut merged: Vec<TimeSlot> = vec![intervals[0]];
    for slot in intervals.into_iter().skip(1) {
        let last = merged.last_mut().expect("merged is non-empty");
        if slot.start <= last.end {
            last.end = last.end.max(slot.end);
        } else {
            merged.push(slot);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dt(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 18, hour, minute, 0).unwrap()
    }

    fn slot(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeSlot {
        TimeSlot::new(dt(h1, m1), dt(h2, m2)).unwrap()
    }

    #[test]
    fn raw_slots_tile_the_window_with_no_gaps() {
        let window = slot(9, 0, 18, 0);
        let slots = generate_raw_slots(window, 60);
        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0].start, dt(9, 0));
        assert_eq!(slots.last().unwrap().end, dt(18, 0));
        for pair in slots.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn raw_slots_drop_a_trailing_partial_slot() {
        let window = slot(9, 0, 9, 59);
        let slots = generate_raw_slots(window, 60);
        assert!(slots.is_empty());
    }

    #[test]
    fn filter_available_removes_overlapping_slots() {
        let raw = generate_raw_slots(slot(9, 0, 12, 0), 60);
        let busy = vec![slot(10, 0, 11, 0)];
        let available = filter_available(&raw, &busy);
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].start, dt(9, 0));
        assert_eq!(available[1].start, dt(11, 0));
    }

    #[test]
    fn merge_overlapping_and_adjacent_intervals() {
        let intervals = vec![slot(10, 0, 11, 0), slot(10, 30, 12, 0), slot(13, 0, 14, 0)];
        let merged = merge_intervals(intervals);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start, dt(10, 0));
        assert_eq!(merged[0].end, dt(12, 0));
        assert_eq!(merged[1].start, dt(13, 0));
    }
}
