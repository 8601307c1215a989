use std::collections::HashSet;

use shared::types::ServiceId;
use sqlx::PgPool;

use crate::models::{Service, ServiceTimeRule};

pub struct ServiceRepository;

impl ServiceRepository {
    pub async fn find_by_id(pool: &PgPool, id: ServiceId) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, default_duration_minutes, active
            FROM services
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(pool)
        .await
    }

    pub async fn find_active(pool: &PgPool) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, default_duration_minutes, active
            FROM services
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

pub struct ServiceTimeRuleRepository;

impl ServiceTimeRuleRepository {
    /// Step 2 of the availability calculator: the allowed-start-time set
    /// for one service on one weekday, if a rule exists.
    pub async fn find_allowed_start_times(
        pool: &PgPool,
        service_id: ServiceId,
        weekday: i16,
    ) -> Result<Option<HashSet<String>>, sqlx::Error> {
        let row = sqlx::query_as::<_, ServiceTimeRule>(
            r#"
            SELECT id, service_id, weekday, allowed_start_times
            FROM service_time_rules
            WHERE service_id = $1 AND weekday = $2
            "#,
        )
        .bind(service_id.as_uuid())
        .bind(weekday)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| r.allowed_start_times.0.into_iter().collect()))
    }
}
