use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{ProfessionalId, ScheduleExceptionId, SlotBlockId, UserId};
use sqlx::PgPool;

use crate::models::{ScheduleException, SlotBlock};
use crate::repositories::audit_repo::AuditRepository;

pub struct ScheduleExceptionRepository;

impl ScheduleExceptionRepository {
    pub async fn find_for_professional_on_date(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleException>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleException>(
            r#"
            SELECT id, professional_id, date, start_datetime, end_datetime, reason
            FROM schedule_exceptions
            WHERE professional_id = $1 AND date = $2
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Create a one-off exception and, in the same transaction, demote any
    /// overlapping AVAILABLE slots and record the admin action — the
    /// `AdminAudit` wiring the supplemented features note calls for.
    pub async fn create(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
        start_datetime: DateTime<Utc>,
        end_datetime: DateTime<Utc>,
        reason: String,
        actor_id: UserId,
    ) -> Result<ScheduleException, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let id = ScheduleExceptionId::new();
        let row = sqlx::query_as::<_, ScheduleException>(
            r#"
            INSERT INTO schedule_exceptions (id, professional_id, date, start_datetime, end_datetime, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, professional_id, date, start_datetime, end_datetime, reason
            "#,
        )
        .bind(id.as_uuid())
        .bind(professional_id.as_uuid())
        .bind(date)
        .bind(start_datetime)
        .bind(end_datetime)
        .bind(&reason)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE slots
            SET status = 'blocked'
            WHERE professional_id = $1 AND status = 'available' AND start < $3 AND "end" > $2
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(start_datetime)
        .bind(end_datetime)
        .execute(&mut *tx)
        .await?;

        AuditRepository::record_in_tx(
            &mut tx,
            actor_id,
            "create",
            "ScheduleException",
            &id.to_string(),
            Some(reason),
        )
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}

pub struct SlotBlockRepository;

impl SlotBlockRepository {
    pub async fn find_for_professional_on_date(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
    ) -> Result<Vec<SlotBlock>, sqlx::Error> {
        sqlx::query_as::<_, SlotBlock>(
            r#"
            SELECT id, professional_id, date, start_datetime, end_datetime, reason, created_by
            FROM slot_blocks
            WHERE professional_id = $1 AND date = $2
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(date)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
        start_datetime: DateTime<Utc>,
        end_datetime: DateTime<Utc>,
        reason: String,
        created_by: Option<UserId>,
    ) -> Result<SlotBlock, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let id = SlotBlockId::new();
        let row = sqlx::query_as::<_, SlotBlock>(
            r#"
            INSERT INTO slot_blocks (id, professional_id, date, start_datetime, end_datetime, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, professional_id, date, start_datetime, end_datetime, reason, created_by
            "#,
        )
        .bind(id.as_uuid())
        .bind(professional_id.as_uuid())
        .bind(date)
        .bind(start_datetime)
        .bind(end_datetime)
        .bind(&reason)
        .bind(created_by.map(|u| *u.as_uuid()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE slots
            SET status = 'blocked'
            WHERE professional_id = $1 AND status = 'available' AND start < $3 AND "end" > $2
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(start_datetime)
        .bind(end_datetime)
        .execute(&mut *tx)
        .await?;

        if let Some(actor_id) = created_by {
            AuditRepository::record_in_tx(
                &mut tx,
                actor_id,
                "create",
                "SlotBlock",
                &id.to_string(),
                Some(reason),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(row)
    }
}
