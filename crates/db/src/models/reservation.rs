use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{
    AddressId, CancelledBy, ClientId, ProfessionalId, ReservationId, ReservationStatus, ServiceId,
    SlotId, VehicleId,
};
use sqlx::FromRow;

/// A client booking: the aggregate root the lifecycle controller (C6)
/// transitions through its state machine. `confirmation_token` /
/// `token_expires_at` are only set while the reservation sits in
/// `WaitingClient`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub client_id: ClientId,
    pub vehicle_id: Option<VehicleId>,
    pub address_id: Option<AddressId>,
    pub status: ReservationStatus,
    pub cancelled_by: Option<CancelledBy>,
    pub total_minutes: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmation_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Input to create a reservation row. `client_id` must already be
/// resolved (upserted) by the caller.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub client_id: ClientId,
    pub vehicle_id: Option<VehicleId>,
    pub address_id: Option<AddressId>,
    pub total_minutes: i32,
    pub note: Option<String>,
}

/// Link between a reservation and one of the slots it occupies. Every
/// `ReservationSlot` for one reservation shares one professional and the
/// linked slots form a contiguous run in time (enforced by C5's chain
/// construction, not by this type).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReservationSlot {
    pub reservation_id: ReservationId,
    pub slot_id: SlotId,
    pub professional_id: ProfessionalId,
}

/// One requested service frozen onto the reservation at booking time,
/// including the effective duration actually used (override-or-default at
/// the moment of booking, immune to later catalog changes).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReservationService {
    pub reservation_id: ReservationId,
    pub service_id: ServiceId,
    pub professional_id: ProfessionalId,
    pub effective_duration_minutes: i32,
}

/// Append-only audit trail of status transitions for one reservation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StatusHistory {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}
