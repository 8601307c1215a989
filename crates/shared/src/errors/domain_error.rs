use crate::types::ServiceId;
use thiserror::Error;

/// Business-rule violations raised by the scheduling core.
///
/// Variants are grouped by the kinds named in the error handling design:
/// `Validation`, `DomainConflict`, `NotFound`, `StateInvalid`, `AuthZ`,
/// `Transient`, `Integrity`. The grouping is conceptual, not a type-level
/// split — callers match on individual variants.
#[derive(Debug, Error)]
pub enum DomainError {
    // --- Validation ---
    #[error("validation failed: {0}")]
    Validation(String),

    // --- DomainConflict ---
    #[error("slot is not available")]
    SlotUnavailable,

    #[error(
        "insufficient contiguous slots: needed {needed}, found {found} (requires {required_minutes} minutes)"
    )]
    InsufficientContiguousSlots {
        needed: u32,
        found: u32,
        required_minutes: i32,
    },

    #[error("requested service is assigned to a different professional than the slot")]
    ServiceProfessionalMismatch,

    #[error("service {service_id} is not assigned to this professional")]
    ServiceNotAssigned { service_id: ServiceId },

    #[error("slot duration must be positive")]
    SlotZeroDuration,

    #[error("reservations must be made at least one day in advance")]
    LeadTimeViolation,

    #[error("a pending reservation already exists for this client")]
    PendingDuplicate,

    #[error("reservation cannot be completed before its first slot has started")]
    PrematureCompletion,

    // --- NotFound ---
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // --- StateInvalid ---
    #[error("transition from {from} to {to} is not permitted")]
    StateInvalid { from: String, to: String },

    // --- AuthZ ---
    #[error("caller is not authorized to act on this resource")]
    AuthZ,

    // --- Transient ---
    #[error("transient failure, retry: {0}")]
    Transient(String),

    // --- Integrity ---
    #[error("unique constraint violated: {0}")]
    Integrity(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn state_invalid(from: impl ToString, to: impl ToString) -> Self {
        Self::StateInvalid {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
