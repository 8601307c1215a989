use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{ProfessionalId, SlotId, SlotStatus};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::Slot;

pub struct SlotRepository;

impl SlotRepository {
    /// C4 step 3: AVAILABLE slots for a set of qualified professionals on
    /// one date, ordered by `(professional, start)` as the availability
    /// calculator requires.
    pub async fn find_available_for_date(
        pool: &PgPool,
        professional_ids: &[ProfessionalId],
        date: NaiveDate,
    ) -> Result<Vec<Slot>, sqlx::Error> {
        if professional_ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = professional_ids.iter().map(|p| *p.as_uuid()).collect();
        sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, professional_id, date, start, "end", status
            FROM slots
            WHERE professional_id = ANY($1) AND date = $2 AND status = 'available'
            ORDER BY professional_id, start
            "#,
        )
        .bind(&uuids)
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// All slots for `(professional, date)` regardless of status, used by
    /// C3's reconciliation pass to find AVAILABLE slots that no longer
    /// belong and RESERVED/BLOCKED slots that must not be touched.
    pub async fn find_all_for_professional_date(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, sqlx::Error> {
        sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, professional_id, date, start, "end", status
            FROM slots
            WHERE professional_id = $1 AND date = $2
            ORDER BY start
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(date)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_professional_and_start(
        pool: &PgPool,
        professional_id: ProfessionalId,
        start: DateTime<Utc>,
    ) -> Result<Option<Slot>, sqlx::Error> {
        sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, professional_id, date, start, "end", status
            FROM slots
            WHERE professional_id = $1 AND start = $2
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(start)
        .fetch_optional(pool)
        .await
    }

    /// `Slot.lock_by_id` (C2): row-locked read inside the caller's
    /// transaction, used by C5 step 4 and C6 transitions that touch a
    /// specific slot.
    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: SlotId,
    ) -> Result<Option<Slot>, sqlx::Error> {
        sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, professional_id, date, start, "end", status
            FROM slots
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
    }

    /// `Slot.lock_by(professional, start)` (C2): used by C5 step 6 to lock
    /// the next slot in a chain. Lock order is ascending `start` within
    /// one professional, per the concurrency model's deadlock-avoidance
    /// recommendation — callers must invoke this in start-time order.
    pub async fn lock_by_professional_and_start(
        tx: &mut Transaction<'_, Postgres>,
        professional_id: ProfessionalId,
        start: DateTime<Utc>,
    ) -> Result<Option<Slot>, sqlx::Error> {
        sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, professional_id, date, start, "end", status
            FROM slots
            WHERE professional_id = $1 AND start = $2
            FOR UPDATE
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(start)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Create a new AVAILABLE slot (C3 step 6, when `(professional,
    /// start)` doesn't already exist).
    pub async fn create_available(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Slot, sqlx::Error> {
        let id = SlotId::new();
        sqlx::query_as::<_, Slot>(
            r#"
            INSERT INTO slots (id, professional_id, date, start, "end", status)
            VALUES ($1, $2, $3, $4, $5, 'available')
            RETURNING id, professional_id, date, start, "end", status
            "#,
        )
        .bind(id.as_uuid())
        .bind(professional_id.as_uuid())
        .bind(date)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }

    /// Update a locked slot's status within the caller's transaction
    /// (used by C5 to mark slots RESERVED and by C6 to release them back
    /// to AVAILABLE).
    pub async fn set_status_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: SlotId,
        status: SlotStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(r#"UPDATE slots SET status = $2 WHERE id = $1"#)
            .bind(id.as_uuid())
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// `Slot.bulk_set_status` (C2): flip every slot for one professional
    /// in `[start_range, end_range)` from one status to another. Used by
    /// administrative block/exception creation to demote overlapping
    /// AVAILABLE slots directly, ahead of the next `regenerate` pass.
    pub async fn bulk_set_status(
        pool: &PgPool,
        professional_id: ProfessionalId,
        start_range: DateTime<Utc>,
        end_range: DateTime<Utc>,
        from_status: SlotStatus,
        to_status: SlotStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE slots
            SET status = $5
            WHERE professional_id = $1
              AND status = $4
              AND start < $3
              AND "end" > $2
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(start_range)
        .bind(end_range)
        .bind(from_status)
        .bind(to_status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// C3 reconciliation: try to delete a stale AVAILABLE slot; if a
    /// foreign key from `reservation_slots` blocks the delete (historical
    /// linkage to a past reservation), demote it to BLOCKED instead.
    /// Returns `true` if deleted, `false` if demoted.
    pub async fn delete_or_demote(pool: &PgPool, id: SlotId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM slots WHERE id = $1 AND status = 'available'"#)
            .bind(id.as_uuid())
            .execute(pool)
            .await;

        match result {
            Ok(r) if r.rows_affected() > 0 => Ok(true),
            Ok(_) => Ok(false),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                sqlx::query(r#"UPDATE slots SET status = 'blocked' WHERE id = $1"#)
                    .bind(id.as_uuid())
                    .execute(pool)
                    .await?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete AVAILABLE slots strictly before `before_date` that
    /// `regenerate` will never revisit because their date has passed
    /// (`cleanup_stale_slots`, supplemented feature #3 in `SPEC_FULL.md`).
    pub async fn delete_available_before(pool: &PgPool, before_date: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM slots WHERE status = 'available' AND date < $1"#)
            .bind(before_date)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
