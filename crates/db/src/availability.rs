//! Availability Calculator (C4) orchestration: the repository reads named
//! in the component design, composed around `domain::availability`'s pure
//! consolidation logic.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use shared::types::{ProfessionalId, ServiceId};
use sqlx::PgPool;

use domain::availability::{
    compute_offers, intersect_allowed_start_times, intersect_qualified_professionals,
    AllowedStartTimes, CandidateSlot, Offer,
};

use crate::repositories::{
    ProfessionalServiceRepository, ReservationRepository, ServiceRepository,
    ServiceTimeRuleRepository, SlotRepository,
};

/// Compute the consolidated availability offers for a requested set of
/// services on one date, in the configured business time zone.
pub async fn compute_offers_for_date(
    pool: &PgPool,
    service_ids: &[ServiceId],
    date: NaiveDate,
    business_tz: chrono_tz::Tz,
) -> Result<Vec<Offer>, sqlx::Error> {
    if service_ids.is_empty() {
        return Ok(Vec::new());
    }

    // Step 1: qualified professionals, intersected across services.
    let mut per_service_professionals = Vec::with_capacity(service_ids.len());
    for &service_id in service_ids {
        per_service_professionals.push(ProfessionalServiceRepository::qualified_professional_ids(pool, service_id).await?);
    }
    let qualified = intersect_qualified_professionals(&per_service_professionals);
    if qualified.is_empty() {
        return Ok(Vec::new());
    }

    // Step 2: allowed-start-time intersection for the target weekday. The
    // weekday is read directly off the requested calendar date, which is
    // already expressed in the business time zone by the caller.
    let weekday = date.weekday().num_days_from_monday() as i16;
    let mut rule_sets = Vec::new();
    for &service_id in service_ids {
        if let Some(set) = ServiceTimeRuleRepository::find_allowed_start_times(pool, service_id, weekday).await? {
            rule_sets.push(set);
        }
    }
    let allowed = match intersect_allowed_start_times(&rule_sets) {
        Some(allowed) => allowed,
        None => return Ok(Vec::new()),
    };

    // Step 3: candidate AVAILABLE slots for the qualified professionals.
    let professional_ids: Vec<ProfessionalId> = qualified.iter().copied().collect();
    let slots = SlotRepository::find_available_for_date(pool, &professional_ids, date).await?;
    let mut candidates: HashMap<ProfessionalId, Vec<CandidateSlot>> = HashMap::new();
    for slot in slots {
        candidates
            .entry(slot.professional_id)
            .or_default()
            .push(CandidateSlot {
                slot_id: slot.id,
                professional_id: slot.professional_id,
                start: slot.start,
                end: slot.end,
            });
    }

    // Step 4 input: required minutes per professional, summed across the
    // requested services' effective durations.
    let required_minutes = required_minutes_per_professional(pool, &professional_ids, service_ids).await?;

    // Step 5 input: daily active-reservation load per professional.
    let mut daily_load: HashMap<ProfessionalId, i64> = HashMap::new();
    for &professional_id in &professional_ids {
        let count = ReservationRepository::count_active_for_professional_on_date(pool, professional_id, date).await?;
        daily_load.insert(professional_id, count);
    }

    Ok(compute_offers(
        &qualified,
        &required_minutes,
        &candidates,
        &allowed,
        &daily_load,
        business_tz,
    ))
}

async fn required_minutes_per_professional(
    pool: &PgPool,
    professional_ids: &[ProfessionalId],
    service_ids: &[ServiceId],
) -> Result<HashMap<ProfessionalId, i32>, sqlx::Error> {
    let mut defaults: HashMap<ServiceId, i32> = HashMap::new();
    for &service_id in service_ids {
        if let Some(service) = ServiceRepository::find_by_id(pool, service_id).await? {
            defaults.insert(service_id, service.default_duration_minutes);
        }
    }

    let assignments =
        ProfessionalServiceRepository::find_for_professionals_and_services(pool, professional_ids, service_ids)
            .await?;

    let mut required: HashMap<ProfessionalId, i32> = HashMap::new();
    let qualified_ids: HashSet<ProfessionalId> = professional_ids.iter().copied().collect();
    'professional: for &professional_id in &qualified_ids {
        let mut total = 0;
        for &service_id in service_ids {
            let Some(&default_duration) = defaults.get(&service_id) else {
                continue 'professional;
            };
            let Some(assignment) = assignments.get(&(professional_id, service_id)) else {
                continue 'professional;
            };
            total += assignment.effective_duration(default_duration);
        }
        required.insert(professional_id, total);
    }
    Ok(required)
}
