//! Lifecycle Controller (C6) orchestration: row-locked reservation state
//! transitions, slot release, and the collapsed expiry sweep. Delegates
//! every transition decision to `domain::lifecycle`/`domain::events`, and
//! only performs persistence and dispatch here.

use chrono::{DateTime, Duration, Utc};
use shared::config::EngineConfig;
use shared::errors::DomainError;
use shared::types::{CancelledBy, ReservationId, ReservationStatus, SlotStatus};
use sqlx::PgPool;

use domain::events::{events_for, Dispatcher, Transition};
use domain::lifecycle::{can_cancel, check_can_complete, decide_confirm, generate_confirmation_token, ConfirmDecision};

use crate::models::Reservation;
use crate::repositories::{
    AuditRepository, ReservationRepository, ReservationSlotRepository, SlotRepository,
    StatusHistoryRepository,
};
use crate::slot_generator;

/// `confirm_by_token`: the client-facing link handler. Idempotent per
/// `domain::lifecycle::decide_confirm`'s already-confirmed case.
pub async fn confirm_by_token(
    pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
    dispatcher: &Dispatcher,
) -> Result<Reservation, DomainError> {
    let mut tx = pool.begin().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let reservation = ReservationRepository::lock_by_token(&mut tx, token)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?
        .ok_or_else(|| DomainError::not_found("Reservation", token))?;

    let Some(expires_at) = reservation.token_expires_at else {
        return Err(DomainError::state_invalid(reservation.status, ReservationStatus::Confirmed));
    };

    match decide_confirm(reservation.status, expires_at, now) {
        // Read-only outcomes (§4.6): neither "expired" nor "already
        // confirmed" mutates the reservation. The lock is released by
        // committing the otherwise-empty transaction.
        ConfirmDecision::Expired => {
            tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;
            Err(DomainError::state_invalid(reservation.status, ReservationStatus::Confirmed))
        }
        ConfirmDecision::Cancelled => {
            tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;
            Err(DomainError::state_invalid(ReservationStatus::Cancelled, ReservationStatus::Confirmed))
        }
        ConfirmDecision::AlreadyConfirmed => {
            tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;
            Ok(reservation)
        }
        ConfirmDecision::Confirm => {
            let transition = Transition {
                old_status: Some(reservation.status),
                new_status: ReservationStatus::Confirmed,
                created: false,
                confirmed_via_link: true,
            };
            let events = events_for(transition, reservation.id, None, None);

            ReservationRepository::set_status_in_tx(&mut tx, reservation.id, ReservationStatus::Confirmed, None)
                .await
                .map_err(|e| DomainError::Transient(e.to_string()))?;
            // §4.6: "append StatusHistory(RECONFIRMED, previous_status)" —
            // the history entry records RECONFIRMED with the prior status
            // as its note, even though the reservation's own status field
            // becomes CONFIRMED.
            StatusHistoryRepository::append_in_tx(
                &mut tx,
                reservation.id,
                ReservationStatus::Reconfirmed,
                Some(format!("previous status: {}", reservation.status)),
            )
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;

            tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;

            for event in &events {
                dispatcher.dispatch(event).await;
            }

            let mut result = reservation;
            result.status = ReservationStatus::Confirmed;
            Ok(result)
        }
    }
}

/// An admin approving a PENDING reservation, issuing a fresh confirmation
/// link (PENDING -> WAITING_CLIENT).
pub async fn admin_approve(
    pool: &PgPool,
    reservation_id: ReservationId,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<Reservation, DomainError> {
    let mut tx = pool.begin().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let reservation = ReservationRepository::lock_by_id(&mut tx, reservation_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?
        .ok_or_else(|| DomainError::not_found("Reservation", reservation_id))?;

    if reservation.status != ReservationStatus::Pending {
        return Err(DomainError::state_invalid(reservation.status, ReservationStatus::WaitingClient));
    }

    let token = generate_confirmation_token();
    let expires_at = Utc::now() + Duration::hours(config.confirmation_ttl_email_hours);
    ReservationRepository::issue_confirmation_token(
        &mut tx,
        reservation_id,
        ReservationStatus::WaitingClient,
        &token,
        expires_at,
    )
    .await
    .map_err(|e| DomainError::Transient(e.to_string()))?;
    StatusHistoryRepository::append_in_tx(&mut tx, reservation_id, ReservationStatus::WaitingClient, None)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let transition = Transition {
        old_status: Some(ReservationStatus::Pending),
        new_status: ReservationStatus::WaitingClient,
        created: false,
        confirmed_via_link: false,
    };
    let events = events_for(transition, reservation_id, Some((token.clone(), expires_at)), None);
    for event in &events {
        dispatcher.dispatch(event).await;
    }

    let mut result = reservation;
    result.status = ReservationStatus::WaitingClient;
    result.confirmation_token = Some(token);
    result.token_expires_at = Some(expires_at);
    Ok(result)
}

/// Cancel a reservation: release its slots back to AVAILABLE and
/// regenerate the affected dates so the freed time reappears to other
/// clients, per C3's contract with C6.
pub async fn cancel(
    pool: &PgPool,
    reservation_id: ReservationId,
    by: CancelledBy,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<Reservation, DomainError> {
    let mut tx = pool.begin().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let reservation = ReservationRepository::lock_by_id(&mut tx, reservation_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?
        .ok_or_else(|| DomainError::not_found("Reservation", reservation_id))?;

    if !can_cancel(reservation.status) {
        return Err(DomainError::state_invalid(reservation.status, ReservationStatus::Cancelled));
    }

    let links = ReservationSlotRepository::find_for_reservation_in_tx(&mut tx, reservation_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    let mut affected_dates: std::collections::HashSet<(shared::types::ProfessionalId, chrono::NaiveDate)> =
        std::collections::HashSet::new();
    for link in &links {
        let slot = SlotRepository::lock_by_id(&mut tx, link.slot_id)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        if let Some(slot) = slot {
            SlotRepository::set_status_in_tx(&mut tx, slot.id, SlotStatus::Available)
                .await
                .map_err(|e| DomainError::Transient(e.to_string()))?;
            affected_dates.insert((slot.professional_id, slot.date));
        }
    }

    ReservationRepository::set_status_in_tx(&mut tx, reservation_id, ReservationStatus::Cancelled, Some(by))
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    ReservationRepository::clear_confirmation_token(&mut tx, reservation_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    StatusHistoryRepository::append_in_tx(&mut tx, reservation_id, ReservationStatus::Cancelled, None)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    for (professional_id, date) in affected_dates {
        slot_generator::regenerate(
            pool,
            professional_id,
            date,
            config.slot_length_minutes,
            config.business_time_zone,
        )
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    }

    let transition = Transition {
        old_status: Some(reservation.status),
        new_status: ReservationStatus::Cancelled,
        created: false,
        confirmed_via_link: false,
    };
    let events = events_for(transition, reservation_id, None, Some(by));
    for event in &events {
        dispatcher.dispatch(event).await;
    }

    let mut result = reservation;
    result.status = ReservationStatus::Cancelled;
    result.cancelled_by = Some(by);
    Ok(result)
}

/// Mark a reservation COMPLETED once its first slot has started.
pub async fn complete(pool: &PgPool, reservation_id: ReservationId, now: DateTime<Utc>) -> Result<Reservation, DomainError> {
    let mut tx = pool.begin().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let reservation = ReservationRepository::lock_by_id(&mut tx, reservation_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?
        .ok_or_else(|| DomainError::not_found("Reservation", reservation_id))?;

    let links = ReservationSlotRepository::find_for_reservation_in_tx(&mut tx, reservation_id)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    let mut first_start = None;
    for link in &links {
        if let Some(slot) = SlotRepository::lock_by_id(&mut tx, link.slot_id)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?
        {
            first_start = Some(match first_start {
                Some(current) if current < slot.start => current,
                _ => slot.start,
            });
        }
    }
    let first_start = first_start.ok_or_else(|| DomainError::not_found("Slot", reservation_id))?;

    check_can_complete(reservation.status, first_start, now)?;

    ReservationRepository::set_status_in_tx(&mut tx, reservation_id, ReservationStatus::Completed, None)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    StatusHistoryRepository::append_in_tx(&mut tx, reservation_id, ReservationStatus::Completed, None)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;

    let mut result = reservation;
    result.status = ReservationStatus::Completed;
    Ok(result)
}

/// The collapsed single expiry sweep (§4.6): every WAITING_CLIENT
/// reservation whose token has expired transitions to CANCELLED with
/// `cancelled_by=system`, its slots are released, and the affected dates
/// are regenerated — the same slot-release path `cancel` uses. Matches
/// the source system's merged `expire_old_pending`/
/// `expire_waiting_confirmation` jobs (supplemented feature #2 in
/// `SPEC_FULL.md`).
pub async fn sweep_expired_confirmations(
    pool: &PgPool,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<u64, DomainError> {
    let now = Utc::now();
    let expired = ReservationRepository::find_expired_waiting_client(pool, now)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

    let mut swept = 0u64;
    for reservation in expired {
        let mut tx = pool.begin().await.map_err(|e| DomainError::Transient(e.to_string()))?;

        let links = ReservationSlotRepository::find_for_reservation_in_tx(&mut tx, reservation.id)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        let mut affected_dates = std::collections::HashSet::new();
        for link in &links {
            if let Some(slot) = SlotRepository::lock_by_id(&mut tx, link.slot_id)
                .await
                .map_err(|e| DomainError::Transient(e.to_string()))?
            {
                SlotRepository::set_status_in_tx(&mut tx, slot.id, SlotStatus::Available)
                    .await
                    .map_err(|e| DomainError::Transient(e.to_string()))?;
                affected_dates.insert((slot.professional_id, slot.date));
            }
        }

        ReservationRepository::set_status_in_tx(
            &mut tx,
            reservation.id,
            ReservationStatus::Cancelled,
            Some(CancelledBy::System),
        )
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
        ReservationRepository::clear_confirmation_token(&mut tx, reservation.id)
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        StatusHistoryRepository::append_in_tx(
            &mut tx,
            reservation.id,
            ReservationStatus::Cancelled,
            Some("confirmation token expired".into()),
        )
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;

        tx.commit().await.map_err(|e| DomainError::Transient(e.to_string()))?;

        for (professional_id, date) in affected_dates {
            slot_generator::regenerate(
                pool,
                professional_id,
                date,
                config.slot_length_minutes,
                config.business_time_zone,
            )
            .await
            .map_err(|e| DomainError::Transient(e.to_string()))?;
        }

        let transition = Transition {
            old_status: Some(reservation.status),
            new_status: ReservationStatus::Cancelled,
            created: false,
            confirmed_via_link: false,
        };
        let events = events_for(transition, reservation.id, None, Some(CancelledBy::System));
        for event in &events {
            dispatcher.dispatch(event).await;
        }
        swept += 1;
    }

    Ok(swept)
}

/// Record a manual admin cancellation in the audit trail alongside the
/// ordinary cancel flow.
pub async fn admin_cancel_with_audit(
    pool: &PgPool,
    reservation_id: ReservationId,
    actor_id: shared::types::UserId,
    note: Option<String>,
    config: &EngineConfig,
    dispatcher: &Dispatcher,
) -> Result<Reservation, DomainError> {
    let reservation = cancel(pool, reservation_id, CancelledBy::Admin, config, dispatcher).await?;
    AuditRepository::record(pool, actor_id, "cancel", "Reservation", &reservation_id.to_string(), note)
        .await
        .map_err(|e| DomainError::Transient(e.to_string()))?;
    Ok(reservation)
}
