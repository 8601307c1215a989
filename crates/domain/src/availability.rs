//! Availability Calculator (C4).
//!
//! Pure consolidation of candidate slots into consolidated offers. All
//! repository reads (qualified professionals, allowed-start-time rules,
//! candidate slots, daily loads) happen in the caller (`db::availability`);
//! this module only does the set intersection, continuity walk, and
//! load-ordered consolidation, so it can be unit tested without a database.
//!
//! Mirrors the `AvailabilityCalculator` class structure in the source
//! system: one function per computation step, composed by `compute_offers`.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::types::{local_hhmm, ProfessionalId, SlotId};

/// One AVAILABLE slot fetched for a qualified professional on the target
/// date, ordered by `(professional, start)` by the caller.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSlot {
    pub slot_id: SlotId,
    pub professional_id: ProfessionalId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A consolidated availability offer: one local `(start, end)` pair,
/// with the professionals able to deliver it and the id of the slot each
/// would start the booking from, ordered by `(daily_load asc,
/// professional_id asc)` for deterministic client-facing preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub professionals: Vec<ProfessionalId>,
    pub slot_ids: Vec<SlotId>,
}

/// Sentinel for the intersected `ServiceTimeRule.allowed_start_times`:
/// `Unrestricted` when no requested service has a rule for the weekday,
/// `Restricted` otherwise (possibly an empty set, in which case step 2 of
/// the algorithm has already returned `[]` before reaching here).
#[derive(Debug, Clone)]
pub enum AllowedStartTimes {
    Unrestricted,
    Restricted(HashSet<String>),
}

impl AllowedStartTimes {
    fn permits(&self, hhmm: &str) -> bool {
        match self {
            AllowedStartTimes::Unrestricted => true,
            AllowedStartTimes::Restricted(set) => set.contains(hhmm),
        }
    }
}

/// Intersect per-service allowed-start-time sets (step 2). `rules` holds
/// one entry per requested service that has a `ServiceTimeRule` for the
/// target weekday; a service with no rule contributes no entry. Returns
/// `None` if the intersection is empty (caller must short-circuit to `[]`).
pub fn intersect_allowed_start_times(rules: &[HashSet<String>]) -> Option<AllowedStartTimes> {
    if rules.is_empty() {
        return Some(AllowedStartTimes::Unrestricted);
    }
    let mut iter = rules.iter();
    let mut acc = iter.next().cloned().unwrap_or_default();
    for set in iter {
        acc = acc.intersection(set).cloned().collect();
        if acc.is_empty() {
            return None;
        }
    }
    if acc.is_empty() {
        None
    } else {
        Some(AllowedStartTimes::Restricted(acc))
    }
}

/// Intersect the qualified-professional sets for each requested service
/// (step 1).
pub fn intersect_qualified_professionals(
    per_service: &[HashSet<ProfessionalId>],
) -> HashSet<ProfessionalId> {
    let mut iter = per_service.iter();
    let Some(first) = iter.next() else {
        return HashSet::new();
    };
    let mut acc = first.clone();
    for set in iter {
        acc = acc.intersection(set).cloned().collect();
        if acc.is_empty() {
            break;
        }
    }
    acc
}

struct FeasibleStart {
    professional_id: ProfessionalId,
    slot_id: SlotId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Per-professional continuity filter (step 4): for each candidate
/// starting slot, check the allowed-start-time rule, then walk forward
/// requiring exact contiguous starts until accumulated coverage reaches
/// `required_minutes`. A gap disqualifies the start.
fn feasible_starts_for_professional(
    professional_id: ProfessionalId,
    slots: &[CandidateSlot],
    required_minutes: i32,
    allowed: &AllowedStartTimes,
    business_tz: Tz,
) -> Vec<FeasibleStart> {
    let mut sorted: Vec<&CandidateSlot> = slots.iter().collect();
    sorted.sort_by_key(|s| s.start);

    let mut feasible = Vec::new();
    for (i, start_slot) in sorted.iter().enumerate() {
        let hhmm = local_hhmm(start_slot.start, business_tz);
        if !allowed.permits(&hhmm) {
            continue;
        }

        let mut covered_minutes = 0i64;
        let mut expected_next_start = start_slot.start;
        let mut last_end = start_slot.start;
        let mut covers = false;
        for candidate in &sorted[i..] {
            if candidate.start != expected_next_start {
                break;
            }
            covered_minutes += (candidate.end - candidate.start).num_minutes();
            last_end = candidate.end;
            expected_next_start = candidate.end;
            if covered_minutes >= required_minutes as i64 {
                covers = true;
                break;
            }
        }

        if covers {
            feasible.push(FeasibleStart {
                professional_id,
                slot_id: start_slot.slot_id,
                start: start_slot.start,
                end: last_end,
            });
        }
    }
    feasible
}

/// Consolidate feasible starts across professionals into offers (steps
/// 4-6). `required_minutes` and `candidates` are keyed by professional;
/// `daily_load` gives each qualified professional's active-reservation
/// count on the target date.
pub fn compute_offers(
    qualified: &HashSet<ProfessionalId>,
    required_minutes: &HashMap<ProfessionalId, i32>,
    candidates: &HashMap<ProfessionalId, Vec<CandidateSlot>>,
    allowed: &AllowedStartTimes,
    daily_load: &HashMap<ProfessionalId, i64>,
    business_tz: Tz,
) -> Vec<Offer> {
    let mut all_feasible = Vec::new();
    for professional_id in qualified {
        let Some(slots) = candidates.get(professional_id) else {
            continue;
        };
        let Some(&required) = required_minutes.get(professional_id) else {
            continue;
        };
        all_feasible.extend(feasible_starts_for_professional(
            *professional_id,
            slots,
            required,
            allowed,
            business_tz,
        ));
    }

    // Key by local (start, end) so only professionals whose chain produces
    // the exact same run length are grouped into one offer.
    let mut groups: BTreeMap<(DateTime<Utc>, DateTime<Utc>), Vec<(i64, ProfessionalId, SlotId)>> =
        BTreeMap::new();
    for fs in all_feasible {
        let load = daily_load.get(&fs.professional_id).copied().unwrap_or(0);
        groups
            .entry((fs.start, fs.end))
            .or_default()
            .push((load, fs.professional_id, fs.slot_id));
    }

    groups
        .into_iter()
        .map(|((start, end), mut entries)| {
            entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
            let professionals = entries.iter().map(|(_, p, _)| *p).collect();
            let slot_ids = entries.iter().map(|(_, _, s)| *s).collect();
            Offer {
                start,
                end,
                professionals,
                slot_ids,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn pid(n: u128) -> ProfessionalId {
        ProfessionalId::from_uuid(Uuid::from_u128(n))
    }

    fn sid(n: u128) -> SlotId {
        SlotId::from_uuid(Uuid::from_u128(n))
    }

    fn dt(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 18, hour, 0, 0).unwrap()
    }

    fn hourly_slots(professional_id: ProfessionalId, start_hour: u32, end_hour: u32) -> Vec<CandidateSlot> {
        (start_hour..end_hour)
            .map(|h| CandidateSlot {
                slot_id: sid(h as u128 + professional_id.as_uuid().as_u128()),
                professional_id,
                start: dt(h),
                end: dt(h + 1),
            })
            .collect()
    }

    #[test]
    fn qualified_intersection_empty_when_no_overlap() {
        let a: HashSet<_> = [pid(1), pid(2)].into_iter().collect();
        let b: HashSet<_> = [pid(3)].into_iter().collect();
        let result = intersect_qualified_professionals(&[a, b]);
        assert!(result.is_empty());
    }

    #[test]
    fn allowed_start_times_none_when_no_rules() {
        let result = intersect_allowed_start_times(&[]);
        assert!(matches!(result, Some(AllowedStartTimes::Unrestricted)));
    }

    #[test]
    fn allowed_start_times_intersection_narrows() {
        let c: HashSet<String> = ["09:00", "11:00", "13:00"].into_iter().map(String::from).collect();
        let d: HashSet<String> = ["11:00", "13:00", "15:00"].into_iter().map(String::from).collect();
        let result = intersect_allowed_start_times(&[c, d]).unwrap();
        match result {
            AllowedStartTimes::Restricted(set) => {
                assert_eq!(set.len(), 2);
                assert!(set.contains("11:00"));
                assert!(set.contains("13:00"));
            }
            _ => panic!("expected restricted"),
        }
    }

    #[test]
    fn allowed_start_times_empty_intersection_is_none() {
        let c: HashSet<String> = ["09:00"].into_iter().map(String::from).collect();
        let d: HashSet<String> = ["15:00"].into_iter().map(String::from).collect();
        assert!(intersect_allowed_start_times(&[c, d]).is_none());
    }

    #[test]
    fn single_slot_offer_basic_book_scenario() {
        let professional = pid(1);
        let slots = hourly_slots(professional, 9, 18);
        let qualified: HashSet<_> = [professional].into_iter().collect();
        let mut required = HashMap::new();
        required.insert(professional, 60);
        let mut candidates = HashMap::new();
        candidates.insert(professional, slots);
        let load = HashMap::new();

        let offers = compute_offers(
            &qualified,
            &required,
            &candidates,
            &AllowedStartTimes::Unrestricted,
            &load,
            chrono_tz::UTC,
        );

        assert_eq!(offers.len(), 9);
        assert_eq!(offers[0].start, dt(9));
    }

    #[test]
    fn two_slot_chain_requires_contiguous_coverage() {
        let professional = pid(1);
        let slots = hourly_slots(professional, 9, 18);
        let qualified: HashSet<_> = [professional].into_iter().collect();
        let mut required = HashMap::new();
        required.insert(professional, 120);
        let mut candidates = HashMap::new();
        candidates.insert(professional, slots);
        let load = HashMap::new();

        let offers = compute_offers(
            &qualified,
            &required,
            &candidates,
            &AllowedStartTimes::Unrestricted,
            &load,
            chrono_tz::UTC,
        );

        // 9..18 has 9 hourly slots; a 2h run needs two consecutive slots,
        // so the last possible start is 16:00 (16-17, 17-18) => 8 offers.
        assert_eq!(offers.len(), 8);
        assert_eq!(offers.last().unwrap().start, dt(16));
    }

    #[test]
    fn gap_disqualifies_a_start() {
        let professional = pid(1);
        // Slots at 9-10 and 11-12 (gap at 10-11) plus 10-11 missing.
        let slots = vec![
            CandidateSlot {
                slot_id: sid(1),
                professional_id: professional,
                start: dt(9),
                end: dt(10),
            },
            CandidateSlot {
                slot_id: sid(2),
                professional_id: professional,
                start: dt(11),
                end: dt(12),
            },
        ];
        let qualified: HashSet<_> = [professional].into_iter().collect();
        let mut required = HashMap::new();
        required.insert(professional, 120);
        let mut candidates = HashMap::new();
        candidates.insert(professional, slots);
        let load = HashMap::new();

        let offers = compute_offers(
            &qualified,
            &required,
            &candidates,
            &AllowedStartTimes::Unrestricted,
            &load,
            chrono_tz::UTC,
        );
        assert!(offers.is_empty());
    }

    #[test]
    fn consolidation_orders_professionals_by_load_then_id() {
        let p1 = pid(1);
        let p2 = pid(2);
        let qualified: HashSet<_> = [p1, p2].into_iter().collect();
        let mut required = HashMap::new();
        required.insert(p1, 60);
        required.insert(p2, 60);
        let mut candidates = HashMap::new();
        candidates.insert(p1, hourly_slots(p1, 9, 10));
        candidates.insert(p2, hourly_slots(p2, 9, 10));
        let mut load = HashMap::new();
        load.insert(p1, 3);
        load.insert(p2, 1);

        let offers = compute_offers(
            &qualified,
            &required,
            &candidates,
            &AllowedStartTimes::Unrestricted,
            &load,
            chrono_tz::UTC,
        );

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].professionals, vec![p2, p1]);
    }
}
