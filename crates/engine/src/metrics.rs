//! Prometheus metrics for the scheduling engine.
//!
//! Observability stays ambient even though §1's Non-goals exclude a
//! pricing engine and other feature-level concerns: booking attempts,
//! domain conflicts, and dispatcher failures are recorded the way the
//! teacher's `api::metrics` records recurring-booking operations.

use metrics::counter;

/// Metric names recorded by the engine and by `db`/`domain` callers that
/// hold a reference to this module's constants.
pub mod names {
    pub const BOOKING_ATTEMPTS: &str = "booking_attempts_total";
    pub const BOOKING_CONFLICTS: &str = "booking_conflicts_total";
    pub const CONFIRMATIONS: &str = "reservation_confirmations_total";
    pub const CANCELLATIONS: &str = "reservation_cancellations_total";
    pub const EXPIRY_SWEEPS: &str = "reservation_expiry_sweep_total";
    pub const DISPATCH_FAILURES: &str = "event_dispatch_failures_total";
}

/// Record a booking attempt and its outcome (`"success"` or the
/// `DomainError::error_code()` of the conflict it failed with).
pub fn record_booking_attempt(outcome: &str) {
    counter!(names::BOOKING_ATTEMPTS, "outcome" => outcome.to_string()).increment(1);
    if outcome != "success" {
        counter!(names::BOOKING_CONFLICTS, "reason" => outcome.to_string()).increment(1);
    }
}

/// Record a token confirmation outcome (`"confirmed"`, `"already_confirmed"`,
/// `"expired"`, `"cancelled"`).
pub fn record_confirmation(outcome: &str) {
    counter!(names::CONFIRMATIONS, "outcome" => outcome.to_string()).increment(1);
}

/// Record a cancellation, tagged by who initiated it.
pub fn record_cancellation(by: &str) {
    counter!(names::CANCELLATIONS, "by" => by.to_string()).increment(1);
}

/// Record one pass of the expiry sweeper and how many reservations it swept.
pub fn record_expiry_sweep(swept: u64) {
    counter!(names::EXPIRY_SWEEPS).increment(swept);
}

/// Record a dispatcher leaf failure (mail/chat transport), logged and
/// swallowed by `domain::events::Dispatcher` but still counted here.
pub fn record_dispatch_failure(event_kind: &str) {
    counter!(names::DISPATCH_FAILURES, "event" => event_kind.to_string()).increment(1);
}

/// Initialize the Prometheus metrics exporter. Returns a handle the
/// engine can expose on its own health/metrics endpoint if one is ever
/// added; the core itself owns no HTTP surface.
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder")
}
