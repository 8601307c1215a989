use std::sync::Arc;

use domain::events::Dispatcher;
use metrics_exporter_prometheus::PrometheusHandle;
use shared::config::EngineConfig;
use sqlx::PgPool;

/// Process-wide state the engine's background work (the expiry sweeper,
/// and any future in-process job) shares. There is no HTTP surface here —
/// an API layer embedding this crate would hold an equivalent struct of
/// its own and call into `db`/`domain` directly, the way this one does.
#[derive(Clone)]
pub struct EngineState {
    pub pool: PgPool,
    pub config: Arc<EngineConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub metrics_handle: PrometheusHandle,
}

impl EngineState {
    pub fn new(
        pool: PgPool,
        config: EngineConfig,
        dispatcher: Dispatcher,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            metrics_handle,
        }
    }
}
