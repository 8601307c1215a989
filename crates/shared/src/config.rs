use chrono_tz::Tz;

/// Process-wide configuration for the scheduling engine, loaded once at
/// startup from environment variables (`dotenvy`-friendly) the way
/// `main` loads `DATABASE_URL`/`JWT_SECRET` in a conventional service.
///
/// Mirrors the shape named in the external-interfaces configuration
/// object: `{business_time_zone, slot_length_minutes,
/// booking_lead_time_days, confirmation_ttl_email, confirmation_ttl_chat,
/// max_future_booking_days, phone_country_prefix}`, plus the admin
/// approval notification fan-out toggle left open as a configuration
/// choice.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// IANA time zone all local-time computations (work schedules,
    /// `ServiceTimeRule` HH:MM comparisons, chat date parsing) run in.
    pub business_time_zone: Tz,
    /// Fixed slot length used by the slot generator. Kept configurable
    /// rather than hardcoded at 60, per the open question in the design
    /// notes.
    pub slot_length_minutes: i32,
    /// A reservation's first slot must start after `today + booking_lead_time_days`.
    pub booking_lead_time_days: i64,
    /// TTL for a confirmation token issued via the email path.
    pub confirmation_ttl_email_hours: i64,
    /// TTL for a confirmation token issued via the chat path.
    pub confirmation_ttl_chat_hours: i64,
    /// Furthest date a client may request availability/booking for.
    pub max_future_booking_days: i64,
    /// Country calling-code prefix assumed when normalizing phone numbers
    /// for the chat session's identity lookup (e.g. `"56"` for Chile).
    pub phone_country_prefix: String,
    /// Whether an admin approval issues an email confirmation link.
    pub notify_admin_approval_email: bool,
    /// Whether an admin approval issues a chat confirmation link.
    pub notify_admin_approval_chat: bool,
}

impl EngineConfig {
    /// Load configuration from environment variables, applying the same
    /// defaults as the source system where a variable is unset.
    pub fn from_env() -> Self {
        let business_time_zone = std::env::var("BUSINESS_TIME_ZONE")
            .ok()
            .and_then(|v| v.parse::<Tz>().ok())
            .unwrap_or(chrono_tz::America::Santiago);

        let slot_length_minutes = std::env::var("SLOT_LENGTH_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let booking_lead_time_days = std::env::var("BOOKING_LEAD_TIME_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let confirmation_ttl_email_hours = std::env::var("CONFIRMATION_TTL_EMAIL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(48);

        let confirmation_ttl_chat_hours = std::env::var("CONFIRMATION_TTL_CHAT_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        let max_future_booking_days = std::env::var("MAX_FUTURE_BOOKING_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(90);

        let phone_country_prefix =
            std::env::var("PHONE_COUNTRY_PREFIX").unwrap_or_else(|_| "56".to_string());

        let notify_admin_approval_email = std::env::var("NOTIFY_ADMIN_APPROVAL_EMAIL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        let notify_admin_approval_chat = std::env::var("NOTIFY_ADMIN_APPROVAL_CHAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        Self {
            business_time_zone,
            slot_length_minutes,
            booking_lead_time_days,
            confirmation_ttl_email_hours,
            confirmation_ttl_chat_hours,
            max_future_booking_days,
            phone_country_prefix,
            notify_admin_approval_email,
            notify_admin_approval_chat,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            business_time_zone: chrono_tz::America::Santiago,
            slot_length_minutes: 60,
            booking_lead_time_days: 1,
            confirmation_ttl_email_hours: 48,
            confirmation_ttl_chat_hours: 2,
            max_future_booking_days: 90,
            phone_country_prefix: "56".to_string(),
            notify_admin_approval_email: true,
            notify_admin_approval_chat: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_system() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.slot_length_minutes, 60);
        assert_eq!(cfg.booking_lead_time_days, 1);
        assert_eq!(cfg.confirmation_ttl_email_hours, 48);
        assert_eq!(cfg.confirmation_ttl_chat_hours, 2);
    }
}
