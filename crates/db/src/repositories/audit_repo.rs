use chrono::Utc;
use shared::types::{AdminAuditId, UserId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::AdminAudit;

pub struct AuditRepository;

impl AuditRepository {
    pub async fn record(
        pool: &PgPool,
        actor_id: UserId,
        action: &str,
        model_name: &str,
        object_id: &str,
        note: Option<String>,
    ) -> Result<AdminAudit, sqlx::Error> {
        let id = AdminAuditId::new();
        sqlx::query_as::<_, AdminAudit>(
            r#"
            INSERT INTO admin_audit (id, actor_id, action, model_name, object_id, timestamp, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, actor_id, action, model_name, object_id, timestamp, note
            "#,
        )
        .bind(id.as_uuid())
        .bind(actor_id.as_uuid())
        .bind(action)
        .bind(model_name)
        .bind(object_id)
        .bind(Utc::now())
        .bind(note)
        .fetch_one(pool)
        .await
    }

    pub async fn record_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        actor_id: UserId,
        action: &str,
        model_name: &str,
        object_id: &str,
        note: Option<String>,
    ) -> Result<AdminAudit, sqlx::Error> {
        let id = AdminAuditId::new();
        sqlx::query_as::<_, AdminAudit>(
            r#"
            INSERT INTO admin_audit (id, actor_id, action, model_name, object_id, timestamp, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, actor_id, action, model_name, object_id, timestamp, note
            "#,
        )
        .bind(id.as_uuid())
        .bind(actor_id.as_uuid())
        .bind(action)
        .bind(model_name)
        .bind(object_id)
        .bind(Utc::now())
        .bind(note)
        .fetch_one(&mut **tx)
        .await
    }
}
