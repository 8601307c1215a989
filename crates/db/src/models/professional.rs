use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use shared::types::{BreakId, ProfessionalId, ProfessionalServiceId, ServiceId, UserId, WorkScheduleId};
use sqlx::FromRow;

/// A professional able to perform services and subject to a weekly work
/// schedule. `accepts_reservations` gates whether C4 ever considers this
/// professional, independent of `active` (a professional can be active in
/// the catalog but temporarily paused for bookings).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Professional {
    pub id: ProfessionalId,
    pub display_name: String,
    pub active: bool,
    pub accepts_reservations: bool,
    pub linked_user_id: Option<UserId>,
}

/// Association between one professional and one service, with an
/// optional per-professional duration override. `(professional, service)`
/// is unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProfessionalService {
    pub id: ProfessionalServiceId,
    pub professional_id: ProfessionalId,
    pub service_id: ServiceId,
    pub duration_override_minutes: Option<i32>,
    pub active: bool,
}

impl ProfessionalService {
    /// The effective duration used by C4/C5: the override if present,
    /// else the service's default duration.
    pub fn effective_duration(&self, default_duration_minutes: i32) -> i32 {
        self.duration_override_minutes.unwrap_or(default_duration_minutes)
    }
}

/// The weekly working-hours template for one professional.
/// `(professional, weekday)` is unique; `start_time < end_time` is
/// enforced at creation (see `WorkSchedule::new`) and by a DB constraint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub id: WorkScheduleId,
    pub professional_id: ProfessionalId,
    /// `0 = Monday .. 6 = Sunday`, matching `shared::types::local_weekday`.
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub active: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("work schedule start_time must be before end_time")]
pub struct InvalidWorkSchedule;

impl WorkSchedule {
    pub fn new(
        professional_id: ProfessionalId,
        weekday: i16,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, InvalidWorkSchedule> {
        if start_time >= end_time {
            return Err(InvalidWorkSchedule);
        }
        Ok(Self {
            id: WorkScheduleId::new(),
            professional_id,
            weekday,
            start_time,
            end_time,
            active: true,
        })
    }
}

/// A recurring break inside a `WorkSchedule`'s window (lunch, etc.).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Break {
    pub id: BreakId,
    pub work_schedule_id: WorkScheduleId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn effective_duration_prefers_override() {
        let ps = ProfessionalService {
            id: ProfessionalServiceId::new(),
            professional_id: ProfessionalId::from_uuid(Uuid::from_u128(1)),
            service_id: ServiceId::from_uuid(Uuid::from_u128(2)),
            duration_override_minutes: Some(45),
            active: true,
        };
        assert_eq!(ps.effective_duration(60), 45);
    }

    #[test]
    fn effective_duration_falls_back_to_default() {
        let ps = ProfessionalService {
            id: ProfessionalServiceId::new(),
            professional_id: ProfessionalId::from_uuid(Uuid::from_u128(1)),
            service_id: ServiceId::from_uuid(Uuid::from_u128(2)),
            duration_override_minutes: None,
            active: true,
        };
        assert_eq!(ps.effective_duration(60), 60);
    }

    #[test]
    fn work_schedule_rejects_inverted_window() {
        let pid = ProfessionalId::new();
        let start = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(WorkSchedule::new(pid, 0, start, end).is_err());
    }
}
