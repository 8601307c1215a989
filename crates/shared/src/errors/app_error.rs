use super::DomainError;
use thiserror::Error;

/// Application-level errors (includes infrastructure, on top of domain
/// conflicts). `status_code()`/`error_code()` exist purely so a future API
/// layer can translate these without reaching into domain internals; this
/// crate never performs HTTP framing itself.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(String),

    #[error("external adapter error: {0}")]
    ExternalApi(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied")]
    Forbidden,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("request timeout")]
    Timeout,

    #[error("rate limit exceeded")]
    RateLimited,
}

impl AppError {
    /// HTTP-shaped status code, for a future API layer to map onto a
    /// response. This crate never produces an HTTP response itself.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Domain(e) => match e {
                DomainError::SlotUnavailable
                | DomainError::InsufficientContiguousSlots { .. }
                | DomainError::ServiceProfessionalMismatch
                | DomainError::ServiceNotAssigned { .. }
                | DomainError::SlotZeroDuration
                | DomainError::LeadTimeViolation
                | DomainError::PendingDuplicate
                | DomainError::PrematureCompletion
                | DomainError::Integrity(_) => 409, // Conflict
                DomainError::NotFound { .. } => 404,
                DomainError::StateInvalid { .. } => 409,
                DomainError::AuthZ => 403,
                DomainError::Transient(_) => 503,
                DomainError::Validation(_) => 422,
            },
            AppError::Database(_) | AppError::Internal(_) => 500,
            AppError::ExternalApi(_) => 503,
            AppError::Unauthorized => 401,
            AppError::Forbidden => 403,
            AppError::NotFound(_) => 404,
            AppError::Validation(_) => 422,
            AppError::Timeout => 504,
            AppError::RateLimited => 429,
        }
    }

    /// Machine-readable error code matching the `DomainConflict` names in
    /// the error taxonomy (`SLOT_UNAVAILABLE`, `INSUFFICIENT_CONTIGUOUS_SLOTS`, ...).
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Domain(e) => match e {
                DomainError::SlotUnavailable => "SLOT_UNAVAILABLE",
                DomainError::InsufficientContiguousSlots { .. } => "INSUFFICIENT_CONTIGUOUS_SLOTS",
                DomainError::ServiceProfessionalMismatch => "SERVICE_PROFESSIONAL_MISMATCH",
                DomainError::ServiceNotAssigned { .. } => "SERVICE_NOT_ASSIGNED",
                DomainError::SlotZeroDuration => "SLOT_ZERO_DURATION",
                DomainError::LeadTimeViolation => "LEAD_TIME_VIOLATION",
                DomainError::PendingDuplicate => "PENDING_DUPLICATE",
                DomainError::PrematureCompletion => "PREMATURE_COMPLETION",
                DomainError::NotFound { .. } => "NOT_FOUND",
                DomainError::StateInvalid { .. } => "STATE_INVALID",
                DomainError::AuthZ => "AUTHZ",
                DomainError::Transient(_) => "TRANSIENT",
                DomainError::Integrity(_) => "INTEGRITY",
                DomainError::Validation(_) => "VALIDATION",
            },
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::ExternalApi(_) => "EXTERNAL_API_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Timeout => "TIMEOUT",
            AppError::RateLimited => "RATE_LIMITED",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database error");
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut => AppError::Timeout,
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
