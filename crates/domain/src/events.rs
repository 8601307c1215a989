//! Event Dispatcher (C7).
//!
//! A thin observer over Reservation status transitions. `events_for`
//! (pure, unit-testable) decides which typed events a transition raises;
//! the caller (`db::lifecycle`) is responsible for actually handing those
//! events to a `Dispatcher` after the transaction commits — dispatch is
//! asynchronous and best-effort, never blocking the transition and never
//! surfacing its own errors to the originating request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::{ReservationId, ReservationStatus};

/// Typed events the lifecycle controller can raise. Each variant names its
/// own recipient; the dispatcher has no generic "notify" concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Raised when a reservation is first created as PENDING (unless the
    /// transition was itself a token confirmation, flagged by
    /// `confirmed_via_link`, which must not re-trigger this).
    ClientConfirmationRequested {
        reservation_id: ReservationId,
        token: String,
        expires_at: DateTime<Utc>,
    },
    /// Raised when a client confirms via token (WAITING_CLIENT -> CONFIRMED).
    ProfessionalNotification { reservation_id: ReservationId },
    /// Raised when an admin approves a PENDING reservation, issuing a
    /// confirmation link (PENDING -> WAITING_CLIENT, admin path).
    ConfirmationLinkIssued {
        reservation_id: ReservationId,
        token: String,
    },
    /// Raised on any transition into CANCELLED.
    ReservationCancelled {
        reservation_id: ReservationId,
        cancelled_by: shared::types::CancelledBy,
    },
}

impl Event {
    /// Idempotency key for at-least-once delivery: outbound chat/template
    /// sends derive their dedup key from `reservation_id:event_kind` so a
    /// retried dispatch after a crash doesn't double-send.
    pub fn idempotency_key(&self) -> String {
        match self {
            Event::ClientConfirmationRequested { reservation_id, .. } => {
                format!("{}:confirmation_requested", reservation_id)
            }
            Event::ProfessionalNotification { reservation_id } => {
                format!("{}:professional_notification", reservation_id)
            }
            Event::ConfirmationLinkIssued { reservation_id, .. } => {
                format!("{}:confirmation_link_issued", reservation_id)
            }
            Event::ReservationCancelled { reservation_id, .. } => {
                format!("{}:cancelled", reservation_id)
            }
        }
    }
}

/// A transition observed by the dispatcher. `created` distinguishes a
/// freshly-inserted PENDING reservation from a later PENDING->PENDING
/// no-op (which cannot occur, but keeps the trigger table explicit).
/// `confirmed_via_link` suppresses `ClientConfirmationRequested` when the
/// transition that produced `new=PENDING` was itself driven by a token
/// confirmation replay rather than a fresh booking — mirrors the explicit
/// parameter the design notes call for in place of an in-memory attribute
/// mutation on the source's model instance.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub old_status: Option<ReservationStatus>,
    pub new_status: ReservationStatus,
    pub created: bool,
    pub confirmed_via_link: bool,
}

/// Decide which events a status transition raises (the trigger table in
/// the component design). Pure; no I/O, no clock reads beyond what the
/// caller already captured in `token`/`expires_at`/`cancelled_by`.
pub fn events_for(
    transition: Transition,
    reservation_id: ReservationId,
    token_and_expiry: Option<(String, DateTime<Utc>)>,
    cancelled_by: Option<shared::types::CancelledBy>,
) -> Vec<Event> {
    let mut events = Vec::new();

    if transition.created
        && transition.new_status == ReservationStatus::Pending
        && !transition.confirmed_via_link
    {
        if let Some((token, expires_at)) = token_and_expiry.clone() {
            events.push(Event::ClientConfirmationRequested {
                reservation_id,
                token,
                expires_at,
            });
        }
    }

    if transition.old_status == Some(ReservationStatus::WaitingClient)
        && transition.new_status == ReservationStatus::Confirmed
    {
        events.push(Event::ProfessionalNotification { reservation_id });
    }

    if transition.old_status == Some(ReservationStatus::Pending)
        && transition.new_status == ReservationStatus::WaitingClient
    {
        if let Some((token, _)) = token_and_expiry {
            events.push(Event::ConfirmationLinkIssued {
                reservation_id,
                token,
            });
        }
    }

    if transition.new_status == ReservationStatus::Cancelled {
        if let Some(by) = cancelled_by {
            events.push(Event::ReservationCancelled {
                reservation_id,
                cancelled_by: by,
            });
        }
    }

    events
}

/// Outbound email port. Implementations live in `integrations`.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        template: &str,
        recipients: &[String],
        context: serde_json::Value,
    ) -> Result<(), LeafError>;
}

/// Outbound chat port (Meta-Cloud-style template API). Implementations
/// live in `integrations`.
#[async_trait]
pub trait Chat: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), LeafError>;
    async fn send_template(
        &self,
        to: &str,
        name: &str,
        params: serde_json::Value,
    ) -> Result<(), LeafError>;
}

/// Transport-level failure from a notification adapter. The dispatcher
/// logs and swallows these; they never propagate to the caller of the
/// lifecycle transition that raised the event.
#[derive(Debug, thiserror::Error)]
#[error("notification transport error: {0}")]
pub struct LeafError(pub String);

/// Dispatches events to the mail/chat ports, logging and continuing past
/// any leaf failure. Construct once per process with the concrete
/// adapters wired in from `integrations`.
pub struct Dispatcher {
    mailer: Box<dyn Mailer>,
    chat: Box<dyn Chat>,
}

impl Dispatcher {
    pub fn new(mailer: Box<dyn Mailer>, chat: Box<dyn Chat>) -> Self {
        Self { mailer, chat }
    }

    /// Dispatch a single event. Never returns an error to the caller;
    /// failures are logged at `warn!` per the at-least-once/log-and-continue
    /// contract in the concurrency model.
    pub async fn dispatch(&self, event: &Event) {
        let key = event.idempotency_key();
        let result = match event {
            Event::ClientConfirmationRequested {
                reservation_id,
                token,
                expires_at,
            } => {
                self.mailer
                    .send(
                        "client_confirmation_requested",
                        &[],
                        serde_json::json!({
                            "reservation_id": reservation_id.to_string(),
                            "token": token,
                            "expires_at": expires_at.to_rfc3339(),
                        }),
                    )
                    .await
            }
            Event::ProfessionalNotification { reservation_id } => {
                self.mailer
                    .send(
                        "professional_notification",
                        &[],
                        serde_json::json!({ "reservation_id": reservation_id.to_string() }),
                    )
                    .await
            }
            Event::ConfirmationLinkIssued {
                reservation_id,
                token,
            } => {
                self.chat
                    .send_template(
                        "",
                        "confirmation_link_issued",
                        serde_json::json!({
                            "reservation_id": reservation_id.to_string(),
                            "token": token,
                        }),
                    )
                    .await
            }
            Event::ReservationCancelled {
                reservation_id,
                cancelled_by,
            } => {
                self.mailer
                    .send(
                        "reservation_cancelled",
                        &[],
                        serde_json::json!({
                            "reservation_id": reservation_id.to_string(),
                            "cancelled_by": format!("{:?}", cancelled_by),
                        }),
                    )
                    .await
            }
        };

        if let Err(err) = result {
            tracing::warn!(idempotency_key = %key, error = %err, "event dispatch failed, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rid() -> ReservationId {
        ReservationId::from_uuid(Uuid::from_u128(1))
    }

    #[test]
    fn creation_raises_confirmation_request_unless_via_link() {
        let t = Transition {
            old_status: None,
            new_status: ReservationStatus::Pending,
            created: true,
            confirmed_via_link: false,
        };
        let events = events_for(
            t,
            rid(),
            Some(("tok".into(), Utc::now())),
            None,
        );
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ClientConfirmationRequested { .. }));
    }

    #[test]
    fn confirmed_via_link_suppresses_confirmation_request() {
        let t = Transition {
            old_status: None,
            new_status: ReservationStatus::Pending,
            created: true,
            confirmed_via_link: true,
        };
        let events = events_for(t, rid(), Some(("tok".into(), Utc::now())), None);
        assert!(events.is_empty());
    }

    #[test]
    fn waiting_client_to_confirmed_notifies_professional() {
        let t = Transition {
            old_status: Some(ReservationStatus::WaitingClient),
            new_status: ReservationStatus::Confirmed,
            created: false,
            confirmed_via_link: false,
        };
        let events = events_for(t, rid(), None, None);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ProfessionalNotification { .. }));
    }

    #[test]
    fn re_confirm_does_not_emit_a_second_notification() {
        // old=CONFIRMED new=RECONFIRMED is not the WAITING_CLIENT->CONFIRMED
        // trigger, so no event fires — matches scenario 5's "does not emit
        // a second notification" on token replay.
        let t = Transition {
            old_status: Some(ReservationStatus::Confirmed),
            new_status: ReservationStatus::Reconfirmed,
            created: false,
            confirmed_via_link: true,
        };
        let events = events_for(t, rid(), None, None);
        assert!(events.is_empty());
    }

    #[test]
    fn cancellation_raises_cancelled_event() {
        let t = Transition {
            old_status: Some(ReservationStatus::Pending),
            new_status: ReservationStatus::Cancelled,
            created: false,
            confirmed_via_link: false,
        };
        let events = events_for(t, rid(), None, Some(shared::types::CancelledBy::Client));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ReservationCancelled { .. }));
    }

    #[test]
    fn idempotency_key_is_reservation_and_kind() {
        let e = Event::ProfessionalNotification {
            reservation_id: rid(),
        };
        assert_eq!(
            e.idempotency_key(),
            format!("{}:professional_notification", rid())
        );
    }
}
