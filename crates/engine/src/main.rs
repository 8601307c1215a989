use engine::{build_dispatcher, init_metrics, run_expiry_sweeper_loop, EngineState};
use shared::config::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Check for --migrate-only flag
    let migrate_only = std::env::args().any(|arg| arg == "--migrate-only");

    // Initialize Prometheus metrics
    let metrics_handle = init_metrics();
    tracing::info!("Prometheus metrics initialized");

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // Create database pool
    let pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Database migrations complete");

    // Exit early if only running migrations
    if migrate_only {
        tracing::info!("Migration-only mode, exiting");
        return;
    }

    // Engine-wide configuration (business time zone, slot length, TTLs, ...)
    let config = EngineConfig::from_env();

    // Outbound notification transport for C7's dispatcher
    let sendgrid_api_key = std::env::var("SENDGRID_API_KEY").unwrap_or_default();
    let mail_from = std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@example.com".to_string());
    let whatsapp_access_token = std::env::var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default();
    let whatsapp_phone_number_id = std::env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default();
    let dispatcher = build_dispatcher(sendgrid_api_key, mail_from, whatsapp_access_token, whatsapp_phone_number_id);

    let state = EngineState::new(pool, config, dispatcher, metrics_handle);

    tracing::info!("Starting expiry sweeper loop");
    run_expiry_sweeper_loop(state).await;
}
