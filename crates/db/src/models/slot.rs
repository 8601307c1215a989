use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{ProfessionalId, ScheduleExceptionId, SlotBlockId, SlotId, SlotStatus, UserId};
use sqlx::FromRow;

/// A fixed-length interval of time for one professional, with a status
/// owned by the slot generator and the booking transactor. Unique on
/// `(professional_id, start)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: SlotStatus,
}

/// One-off unavailability for a professional (vacation, event), distinct
/// from the recurring `Break`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduleException {
    pub id: ScheduleExceptionId,
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub reason: String,
}

/// A manually declared busy interval, e.g. an admin blocking out time for
/// a professional.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SlotBlock {
    pub id: SlotBlockId,
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub reason: String,
    pub created_by: Option<UserId>,
}
