use serde::{Deserialize, Serialize};
use shared::types::{AddressId, ClientId, CommuneId, VehicleId};
use sqlx::FromRow;

/// The person a reservation is made for. Resolved/upserted by email in
/// the booking transactor (C5); phone is used independently by the chat
/// FSM (C8) identity lookup.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// A client's vehicle, upserted by `(owner, plate)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub owner_id: ClientId,
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

/// A commune (administrative subdivision) address input resolves against,
/// either by id or by case-insensitive name — the legacy free-text match
/// the design notes call a compatibility shim kept alongside the
/// first-class id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Commune {
    pub id: CommuneId,
    pub name: String,
}

/// A client's address, upserted by `(owner, alias)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub owner_id: ClientId,
    pub alias: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub commune_id: CommuneId,
}
