use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Lifecycle status of a `Reservation`. See the Lifecycle Controller state
/// diagram: `Pending -> WaitingClient -> Confirmed -> InProgress ->
/// Completed`, with `Cancelled`/`NoShow` reachable from several states and
/// `Reconfirmed` an optional re-confirmation step after `Confirmed`. A
/// WAITING_CLIENT reservation whose confirmation token expires transitions
/// to `Cancelled` with `cancelled_by=System`, not a distinct status — the
/// state diagram has no "expired" state.
/// Terminal states: `Cancelled`, `Completed`, `NoShow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    WaitingClient,
    Confirmed,
    Reconfirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// Terminal states never transition further (status monotonicity).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::NoShow)
    }

    /// Statuses counted as "active" for daily-load purposes and for
    /// duplicate-pending detection.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Pending
                | Self::WaitingClient
                | Self::Confirmed
                | Self::Reconfirmed
                | Self::InProgress
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::WaitingClient => "waiting_client",
            Self::Confirmed => "confirmed",
            Self::Reconfirmed => "reconfirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        };
        write!(f, "{}", s)
    }
}

/// Status of a `Slot`. Owned by the professional; written by the slot
/// generator (`Available`/`Blocked`) and the booking transactor
/// (`Reserved`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "slot_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Blocked,
    Reserved,
}

/// Who initiated a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "cancelled_by", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Admin,
    Client,
    ClientChat,
    System,
}

/// Conversation state for the per-phone chat session FSM (C8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "chat_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Menu,
    SelectService,
    SelectDate,
    SelectTime,
    WaitingForEmail,
    WaitingForAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::Completed.is_terminal());
        assert!(ReservationStatus::NoShow.is_terminal());
        assert!(!ReservationStatus::Pending.is_terminal());
        assert!(!ReservationStatus::Confirmed.is_terminal());
    }

    #[test]
    fn active_states_match_daily_load_definition() {
        assert!(ReservationStatus::Pending.is_active());
        assert!(ReservationStatus::WaitingClient.is_active());
        assert!(ReservationStatus::Confirmed.is_active());
        assert!(ReservationStatus::Reconfirmed.is_active());
        assert!(ReservationStatus::InProgress.is_active());
        assert!(!ReservationStatus::Completed.is_active());
        assert!(!ReservationStatus::Cancelled.is_active());
        assert!(!ReservationStatus::NoShow.is_active());
    }
}
