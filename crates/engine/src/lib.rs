//! Process bootstrap for the appointment scheduling engine: tracing,
//! metrics, configuration, and a Postgres pool, plus the one background
//! job the core owns outright — the C6 expiry sweeper. No HTTP routes
//! live here (out of scope per the core's purpose and scope); an API
//! layer embeds this crate alongside its own router rather than the
//! other way around.

pub mod error;
pub mod metrics;
pub mod state;

pub use error::EngineError;
pub use metrics::init_metrics;
pub use state::EngineState;

use std::time::Duration;

use domain::events::Dispatcher;
use integrations::{HttpMailer, WhatsAppClient};

/// How often the expiry sweeper wakes up to look for WAITING_CLIENT
/// reservations whose confirmation token has expired. Kept short relative
/// to the shortest configured TTL (`confirmation_ttl_chat_hours`) so an
/// expired chat-issued token is swept promptly.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Construct the concrete `Dispatcher` wired to the reqwest-based mail
/// and chat adapters, the way a production deployment's bootstrap would —
/// mirrors the teacher's `AppState::with_supabase` composing its outbound
/// clients from env-sourced credentials.
pub fn build_dispatcher(
    sendgrid_api_key: String,
    mail_from: String,
    whatsapp_access_token: String,
    whatsapp_phone_number_id: String,
) -> Dispatcher {
    let mailer = Box::new(HttpMailer::new(sendgrid_api_key, mail_from));
    let chat = Box::new(WhatsAppClient::new(whatsapp_access_token, whatsapp_phone_number_id));
    Dispatcher::new(mailer, chat)
}

/// Run the C6 expiry sweep forever, once every [`SWEEP_INTERVAL`]. A
/// failed sweep pass is logged and retried on the next tick rather than
/// aborting the loop — matching the error-handling design's "expiry
/// sweeping log-and-continue; it never surfaces errors to the originating
/// request" rule, generalized to "the loop has no originating request".
pub async fn run_expiry_sweeper_loop(state: EngineState) -> ! {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match db::lifecycle::sweep_expired_confirmations(&state.pool, &state.config, &state.dispatcher).await {
            Ok(swept) => {
                if swept > 0 {
                    tracing::info!(swept, "expiry sweep released reservations");
                }
                metrics::record_expiry_sweep(swept);
            }
            Err(err) => {
                tracing::error!(error = %err, "expiry sweep pass failed, retrying next tick");
            }
        }
    }
}
