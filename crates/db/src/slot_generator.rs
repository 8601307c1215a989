//! Slot Generator (C3) orchestration: fetches a professional's working
//! hours, breaks, exceptions and blocks for one date, derives the
//! available windows with `domain::slot_rules`, and reconciles the result
//! against the existing `slots` rows without disturbing anything already
//! RESERVED.

use chrono::{Datelike, NaiveDate};
use shared::types::{local_datetime, ProfessionalId, SlotStatus, TimeSlot};
use sqlx::PgPool;

use domain::slot_rules::{filter_available, generate_raw_slots, merge_intervals};

use crate::repositories::{
    BreakRepository, ScheduleExceptionRepository, SlotBlockRepository, SlotRepository,
    WorkScheduleRepository,
};

/// Regenerate AVAILABLE slots for one `(professional, date)`. Idempotent:
/// re-running it with no schedule changes leaves the slot set identical.
/// RESERVED and BLOCKED slots are never touched here; BLOCKED slots are
/// only created directly by the exception/slot-block repositories.
pub async fn regenerate(
    pool: &PgPool,
    professional_id: ProfessionalId,
    date: NaiveDate,
    slot_length_minutes: i32,
    business_tz: chrono_tz::Tz,
) -> Result<(), sqlx::Error> {
    let weekday = date.weekday().num_days_from_monday() as i16;

    let Some(schedule) = WorkScheduleRepository::find_active_for_weekday(pool, professional_id, weekday).await?
    else {
        // No working hours for this weekday: reconcile existing AVAILABLE
        // slots away and stop.
        return reconcile(pool, professional_id, date, &[]).await;
    };

    let Some(window_start) = local_datetime(date, schedule.start_time, business_tz) else {
        return Ok(());
    };
    let Some(window_end) = local_datetime(date, schedule.end_time, business_tz) else {
        return Ok(());
    };
    let Ok(window) = TimeSlot::new(window_start, window_end) else {
        return Ok(());
    };

    let mut busy = Vec::new();
    for b in BreakRepository::find_for_work_schedule(pool, schedule.id).await? {
        if let (Some(s), Some(e)) = (
            local_datetime(date, b.start_time, business_tz),
            local_datetime(date, b.end_time, business_tz),
        ) {
            if let Ok(slot) = TimeSlot::new(s, e) {
                busy.push(slot);
            }
        }
    }
    for exc in ScheduleExceptionRepository::find_for_professional_on_date(pool, professional_id, date).await? {
        if let Ok(slot) = TimeSlot::new(exc.start_datetime, exc.end_datetime) {
            busy.push(slot);
        }
    }
    for block in SlotBlockRepository::find_for_professional_on_date(pool, professional_id, date).await? {
        if let Ok(slot) = TimeSlot::new(block.start_datetime, block.end_datetime) {
            busy.push(slot);
        }
    }

    let busy = merge_intervals(busy);
    let raw = generate_raw_slots(window, slot_length_minutes);
    let available = filter_available(&raw, &busy);

    reconcile(pool, professional_id, date, &available).await
}

/// Regenerate every date in `[start_date, start_date + days)`, used at
/// onboarding time and by any schedule-change admin action.
pub async fn regenerate_range(
    pool: &PgPool,
    professional_id: ProfessionalId,
    start_date: NaiveDate,
    days: i64,
    slot_length_minutes: i32,
    business_tz: chrono_tz::Tz,
) -> Result<(), sqlx::Error> {
    for offset in 0..days {
        let date = start_date + chrono::Duration::days(offset);
        regenerate(pool, professional_id, date, slot_length_minutes, business_tz).await?;
    }
    Ok(())
}

/// Reconcile the desired AVAILABLE window set against the database: keep
/// existing AVAILABLE slots that are still wanted, create missing ones,
/// and delete (or demote, if referenced) AVAILABLE slots no longer
/// wanted. RESERVED/BLOCKED slots are left untouched regardless of
/// whether they fall inside `desired`.
async fn reconcile(
    pool: &PgPool,
    professional_id: ProfessionalId,
    date: NaiveDate,
    desired: &[TimeSlot],
) -> Result<(), sqlx::Error> {
    let existing = SlotRepository::find_all_for_professional_date(pool, professional_id, date).await?;

    let mut wanted: std::collections::HashSet<chrono::DateTime<chrono::Utc>> =
        desired.iter().map(|s| s.start).collect();

    for slot in &existing {
        if slot.status != SlotStatus::Available {
            continue;
        }
        if wanted.contains(&slot.start) {
            wanted.remove(&slot.start);
        } else {
            SlotRepository::delete_or_demote(pool, slot.id).await?;
        }
    }

    for slot in desired {
        if wanted.contains(&slot.start) {
            SlotRepository::create_available(pool, professional_id, date, slot.start, slot.end).await?;
        }
    }

    Ok(())
}

/// Seed the default schedule for a newly onboarded professional and
/// immediately generate their first `horizon_days` of AVAILABLE slots
/// (`seed_default_schedule`, supplemented feature #1 in `SPEC_FULL.md`).
pub async fn seed_default_schedule(
    pool: &PgPool,
    professional_id: ProfessionalId,
    today: NaiveDate,
    horizon_days: i64,
    slot_length_minutes: i32,
    business_tz: chrono_tz::Tz,
) -> Result<(), sqlx::Error> {
    WorkScheduleRepository::create_default_schedule(pool, professional_id).await?;
    regenerate_range(pool, professional_id, today, horizon_days, slot_length_minutes, business_tz).await
}

/// Delete AVAILABLE slots whose date has already passed
/// (`cleanup_stale_slots`, supplemented feature #3).
pub async fn cleanup_stale_slots(pool: &PgPool, before_date: NaiveDate) -> Result<u64, sqlx::Error> {
    SlotRepository::delete_available_before(pool, before_date).await
}
