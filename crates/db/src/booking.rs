//! Booking Transactor (C5): the one place a reservation is created. Runs
//! the pre-validation named by the component design outside any
//! transaction, then does the client/vehicle/address upsert, slot-chain
//! locking, and reservation persistence atomically.

use chrono::{DateTime, Duration, Utc};
use shared::config::EngineConfig;
use shared::errors::DomainError;
use shared::types::{CommuneId, ProfessionalId, ReservationStatus, ServiceId, SlotId, SlotStatus};
use sqlx::PgPool;

use domain::booking_rules::{check_lead_time, slots_needed};
use domain::events::{events_for, Dispatcher, Transition};
use domain::lifecycle::generate_confirmation_token;
use domain::masking::is_blank_or_masked;

use crate::models::{NewReservation, Reservation};
use crate::repositories::{
    AddressRepository, ClientRepository, CommuneRepository, ProfessionalServiceRepository,
    ReservationRepository, ReservationServiceRepository, ReservationSlotRepository,
    ServiceRepository, SlotRepository, StatusHistoryRepository, VehicleRepository,
};

/// Channel a booking originated from, which decides the confirmation
/// token's TTL and whether the token is delivered by email or chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingChannel {
    Email,
    Chat,
}

#[derive(Debug, Clone)]
pub struct VehicleInput {
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AddressInput {
    pub alias: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub commune_id: Option<CommuneId>,
    pub commune_name: Option<String>,
}

/// One requested service, carrying its own `professional_id` as the
/// external interface's `service_requests[{service_id, professional_id}]`
/// shape does — a redundant-looking field that exists precisely so step 4
/// of the booking transactor can catch a client request that names a
/// service against a professional other than the one the slot belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ServiceRequest {
    pub service_id: ServiceId,
    pub professional_id: ProfessionalId,
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub client_email: String,
    pub client_first_name: String,
    pub client_last_name: String,
    pub client_phone: Option<String>,
    pub vehicle: Option<VehicleInput>,
    pub address: Option<AddressInput>,
    pub professional_id: ProfessionalId,
    pub service_requests: Vec<ServiceRequest>,
    pub start: DateTime<Utc>,
    pub note: Option<String>,
    pub channel: BookingChannel,
}

/// Pre-validation run outside the transaction (lead time, pending
/// duplicate). Callers must run this before `create_reservation`; it is
/// kept separate so a chat/email handler can surface a friendly error
/// before opening any lock.
pub async fn validate_booking_rules(
    pool: &PgPool,
    request: &BookingRequest,
    config: &EngineConfig,
) -> Result<(), DomainError> {
    let today = Utc::now().with_timezone(&config.business_time_zone).date_naive();
    let slot_local_date = request.start.with_timezone(&config.business_time_zone).date_naive();
    check_lead_time(slot_local_date, today, config.booking_lead_time_days)?;

    let duplicate = ReservationRepository::find_pending_duplicate_by_contact(
        pool,
        &request.client_email,
        request.client_phone.as_deref(),
    )
    .await
    .map_err(|e| DomainError::Transient(e.to_string()))?;
    if duplicate.is_some() {
        return Err(DomainError::PendingDuplicate);
    }
    Ok(())
}

/// Create a reservation for the given request, locking the exact
/// contiguous slot chain the requested services need. `validate_booking_rules`
/// must already have been run by the caller. On success, returns the
/// created reservation and dispatches the `ClientConfirmationRequested`
/// event through `dispatcher`.
pub async fn create_reservation(
    pool: &PgPool,
    request: BookingRequest,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<Reservation, DomainError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    let client = crate::repositories::ClientRepository::upsert_by_email_in_tx(
        &mut tx,
        &request.client_email,
        &request.client_first_name,
        &request.client_last_name,
        request.client_phone.as_deref(),
    )
    .await
    .map_err(|e| DomainError::Transient(e.to_string()))?;

    let vehicle_id = match &request.vehicle {
        Some(v) if !is_blank_or_masked(&v.plate) => {
            let vehicle = VehicleRepository::upsert_in_tx(
                &mut tx,
                client.id,
                &v.plate,
                v.brand.as_deref(),
                v.model.as_deref(),
                v.year,
            )
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
            Some(vehicle.id)
        }
        _ => None,
    };

    let address_id = match &request.address {
        Some(a) if !is_blank_or_masked(&a.street) => {
            let commune_id = resolve_commune(pool, a).await?;
            let address = AddressRepository::upsert_in_tx(
                &mut tx,
                client.id,
                &a.alias,
                &a.street,
                &a.number,
                a.complement.as_deref(),
                commune_id,
            )
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
            Some(address.id)
        }
        _ => None,
    };

    if request
        .service_requests
        .iter()
        .any(|s| s.professional_id != request.professional_id)
    {
        return Err(DomainError::ServiceProfessionalMismatch);
    }

    let service_ids: Vec<ServiceId> = request.service_requests.iter().map(|s| s.service_id).collect();
    let required_minutes = required_minutes_for(pool, request.professional_id, &service_ids).await?;
    let needed = slots_needed(required_minutes, config.slot_length_minutes)?;

    let chain = lock_slot_chain(
        &mut tx,
        request.professional_id,
        request.start,
        needed,
        config.slot_length_minutes,
    )
    .await?;

    for slot in &chain {
        SlotRepository::set_status_in_tx(&mut tx, slot.id, SlotStatus::Reserved)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
    }

    let new_reservation = NewReservation {
        client_id: client.id,
        vehicle_id,
        address_id,
        total_minutes: required_minutes,
        note: request.note.clone(),
    };
    let reservation = ReservationRepository::create_in_tx(&mut tx, &new_reservation)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    for slot in &chain {
        ReservationSlotRepository::link_in_tx(&mut tx, reservation.id, slot.id, request.professional_id)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
    }

    for &service_id in &service_ids {
        let duration =
            effective_duration_for(pool, request.professional_id, service_id).await?;
        ReservationServiceRepository::link_in_tx(
            &mut tx,
            reservation.id,
            service_id,
            request.professional_id,
            duration,
        )
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    }

    let token = generate_confirmation_token();
    let ttl_hours = match request.channel {
        BookingChannel::Email => config.confirmation_ttl_email_hours,
        BookingChannel::Chat => config.confirmation_ttl_chat_hours,
    };
    let expires_at = Utc::now() + Duration::hours(ttl_hours);

    // The chat channel auto-confirms bookings made through it (an
    // intentional carried-over quirk of the source system) instead of
    // going through WAITING_CLIENT confirmation.
    let status = match request.channel {
        BookingChannel::Chat => ReservationStatus::Confirmed,
        BookingChannel::Email => ReservationStatus::Pending,
    };

    ReservationRepository::issue_confirmation_token(&mut tx, reservation.id, status, &token, expires_at)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    StatusHistoryRepository::append_in_tx(&mut tx, reservation.id, status, None)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let transition = Transition {
        old_status: None,
        new_status: status,
        created: true,
        confirmed_via_link: false,
    };
    let events = events_for(
        transition,
        reservation.id,
        Some((token.clone(), expires_at)),
        None,
    );
    for event in &events {
        dispatcher.dispatch(event).await;
    }

    let mut result = reservation;
    result.status = status;
    result.confirmation_token = Some(token);
    result.token_expires_at = Some(expires_at);
    Ok(result)
}

async fn resolve_commune(pool: &PgPool, input: &AddressInput) -> Result<CommuneId, DomainError> {
    if let Some(id) = input.commune_id {
        return Ok(id);
    }
    if let Some(name) = &input.commune_name {
        if let Some(commune) = CommuneRepository::find_by_name_ci(pool, name)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?
        {
            return Ok(commune.id);
        }
    }
    Err(DomainError::Validation("address has no resolvable commune".into()))
}

async fn required_minutes_for(
    pool: &PgPool,
    professional_id: ProfessionalId,
    service_ids: &[ServiceId],
) -> Result<i32, DomainError> {
    let mut total = 0;
    for &service_id in service_ids {
        total += effective_duration_for(pool, professional_id, service_id).await?;
    }
    Ok(total)
}

async fn effective_duration_for(
    pool: &PgPool,
    professional_id: ProfessionalId,
    service_id: ServiceId,
) -> Result<i32, DomainError> {
    let service = ServiceRepository::find_by_id(pool, service_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?
        .ok_or_else(|| DomainError::not_found("Service", service_id))?;
    let assignment = ProfessionalServiceRepository::find_one(pool, professional_id, service_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?
        .ok_or(DomainError::ServiceNotAssigned { service_id })?;
    Ok(assignment.effective_duration(service.default_duration_minutes))
}

struct LockedSlot {
    id: SlotId,
}

/// Lock `needed` contiguous slots starting at `start`, in ascending
/// start-time order (the deadlock-avoidance lock ordering named in the
/// concurrency model). Any missing or non-AVAILABLE slot in the chain
/// fails the whole booking.
async fn lock_slot_chain(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    professional_id: ProfessionalId,
    start: DateTime<Utc>,
    needed: u32,
    slot_length_minutes: i32,
) -> Result<Vec<LockedSlot>, DomainError> {
    let mut chain = Vec::with_capacity(needed as usize);
    let mut cursor = start;
    for _ in 0..needed {
        let slot = SlotRepository::lock_by_professional_and_start(tx, professional_id, cursor)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        let Some(slot) = slot else {
            return Err(DomainError::InsufficientContiguousSlots {
                needed,
                found: chain.len() as u32,
                required_minutes: needed as i32 * slot_length_minutes,
            });
        };
        if slot.status != SlotStatus::Available {
            return Err(DomainError::SlotUnavailable);
        }
        cursor = slot.end;
        chain.push(LockedSlot { id: slot.id });
    }
    Ok(chain)
}
