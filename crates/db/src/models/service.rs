use serde::{Deserialize, Serialize};
use shared::types::{ServiceId, ServiceTimeRuleId};
use sqlx::FromRow;

/// The unit of work a client requests. `default_duration_minutes` is the
/// fallback a `ProfessionalService` override supersedes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub default_duration_minutes: i32,
    pub active: bool,
}

/// Restricts a service to a fixed set of `HH:MM` start times on a given
/// weekday. Absence of a row for `(service, weekday)` means unrestricted,
/// per the open-question decision carried from the source system.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ServiceTimeRule {
    pub id: ServiceTimeRuleId,
    pub service_id: ServiceId,
    pub weekday: i16,
    /// Stored as a JSON array of `"HH:MM"` strings.
    pub allowed_start_times: sqlx::types::Json<Vec<String>>,
}
