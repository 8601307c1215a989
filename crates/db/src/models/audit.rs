use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{AdminAuditId, UserId};
use sqlx::FromRow;

/// Append-only record of a manual admin action: creating a `SlotBlock` or
/// `ScheduleException`, or cancelling a reservation as an admin. Mirrors
/// the source system's `AdminAudit`, which the distilled spec names in
/// the data model but never writes to directly — wired up per the
/// supplemented-features note in `SPEC_FULL.md`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminAudit {
    pub id: AdminAuditId,
    pub actor_id: UserId,
    pub action: String,
    pub model_name: String,
    pub object_id: String,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}
