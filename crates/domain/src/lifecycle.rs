//! Lifecycle Controller (C6) — the pure parts: state-transition legality,
//! confirmation-token decisions, completion eligibility, and token
//! generation. The actual row locking, persistence, and slot release live
//! in `db::lifecycle`, which calls into this module for the decisions.

use chrono::{DateTime, Utc};
use rand::RngCore;
use shared::errors::DomainError;
use shared::types::ReservationStatus;

/// Generate an opaque confirmation token with >= 122 bits of entropy (16
/// random bytes, hex-encoded = 128 bits), unique with overwhelming
/// probability.
pub fn generate_confirmation_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Outcome of `confirm_by_token` once a reservation row has been located
/// and locked. "Not found" is a DB-level concern handled by the caller
/// before this function is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Expired,
    AlreadyConfirmed,
    Cancelled,
    Confirm,
}

/// Decide the outcome of a token confirmation attempt. The expiry check
/// runs before the idempotent already-confirmed check, matching the
/// source system's literal check order: a reservation confirmed long ago
/// whose token has since expired reports `Expired`, not `AlreadyConfirmed`,
/// on replay.
pub fn decide_confirm(
    status: ReservationStatus,
    token_expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ConfirmDecision {
    if token_expires_at < now {
        return ConfirmDecision::Expired;
    }
    match status {
        ReservationStatus::Confirmed | ReservationStatus::Reconfirmed => {
            ConfirmDecision::AlreadyConfirmed
        }
        ReservationStatus::Cancelled => ConfirmDecision::Cancelled,
        _ => ConfirmDecision::Confirm,
    }
}

/// Statuses from which `cancel` is permitted — every non-terminal status.
pub fn can_cancel(status: ReservationStatus) -> bool {
    !status.is_terminal()
}

/// Completion is only permitted from {CONFIRMED, RECONFIRMED,
/// WAITING_CLIENT, IN_PROGRESS}, and only once the reservation's first
/// slot has actually started.
pub fn check_can_complete(
    status: ReservationStatus,
    first_slot_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    let permitted = matches!(
        status,
        ReservationStatus::Confirmed
            | ReservationStatus::Reconfirmed
            | ReservationStatus::WaitingClient
            | ReservationStatus::InProgress
    );
    if !permitted {
        return Err(DomainError::state_invalid(status, ReservationStatus::Completed));
    }
    if first_slot_start > now {
        return Err(DomainError::PrematureCompletion);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn generated_tokens_are_128_bits_of_hex_and_unique() {
        let a = generate_confirmation_token();
        let b = generate_confirmation_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn expiry_takes_precedence_over_already_confirmed() {
        let now = Utc::now();
        let expired = now - Duration::seconds(1);
        let decision = decide_confirm(ReservationStatus::Confirmed, expired, now);
        assert_eq!(decision, ConfirmDecision::Expired);
    }

    #[test]
    fn already_confirmed_is_idempotent_within_ttl() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        assert_eq!(
            decide_confirm(ReservationStatus::Confirmed, future, now),
            ConfirmDecision::AlreadyConfirmed
        );
        assert_eq!(
            decide_confirm(ReservationStatus::Reconfirmed, future, now),
            ConfirmDecision::AlreadyConfirmed
        );
    }

    #[test]
    fn cancelled_reservation_reports_cancelled() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        assert_eq!(
            decide_confirm(ReservationStatus::Cancelled, future, now),
            ConfirmDecision::Cancelled
        );
    }

    #[test]
    fn waiting_client_within_ttl_confirms() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        assert_eq!(
            decide_confirm(ReservationStatus::WaitingClient, future, now),
            ConfirmDecision::Confirm
        );
    }

    #[test]
    fn completion_requires_permitted_status_and_elapsed_start() {
        let now = Utc::now();
        assert!(check_can_complete(ReservationStatus::Confirmed, now - Duration::hours(1), now).is_ok());
        assert!(check_can_complete(ReservationStatus::Pending, now - Duration::hours(1), now).is_err());
        assert!(matches!(
            check_can_complete(ReservationStatus::Confirmed, now + Duration::hours(1), now),
            Err(DomainError::PrematureCompletion)
        ));
    }

    #[test]
    fn cancel_permitted_from_any_non_terminal_status() {
        assert!(can_cancel(ReservationStatus::Pending));
        assert!(can_cancel(ReservationStatus::InProgress));
        assert!(!can_cancel(ReservationStatus::Cancelled));
        assert!(!can_cancel(ReservationStatus::Completed));
        assert!(!can_cancel(ReservationStatus::NoShow));
    }
}
