use shared::AppError;

/// Top-level error for the bootstrap binary. Wraps `AppError` for
/// anything originating in domain/db code and adds the handful of
/// boot-time failures (missing env vars, pool creation) that never
/// reach a request path because there is none.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
}
