use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{ProfessionalId, ReservationId, ReservationStatus};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::{NewReservation, Reservation};

pub struct ReservationRepository;

impl ReservationRepository {
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewReservation,
    ) -> Result<Reservation, sqlx::Error> {
        let id = ReservationId::new();
        let now = Utc::now();
        sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations
                (id, client_id, vehicle_id, address_id, status, cancelled_by,
                 total_minutes, note, created_at, updated_at, confirmation_token, token_expires_at)
            VALUES ($1, $2, $3, $4, 'pending', NULL, $5, $6, $7, $7, NULL, NULL)
            RETURNING id, client_id, vehicle_id, address_id, status, cancelled_by,
                      total_minutes, note, created_at, updated_at, confirmation_token, token_expires_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.client_id.as_uuid())
        .bind(new.vehicle_id.map(|v| *v.as_uuid()))
        .bind(new.address_id.map(|a| *a.as_uuid()))
        .bind(new.total_minutes)
        .bind(&new.note)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: ReservationId) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, client_id, vehicle_id, address_id, status, cancelled_by,
                   total_minutes, note, created_at, updated_at, confirmation_token, token_expires_at
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(pool)
        .await
    }

    /// `Reservation.lock_by_id` (C2), used by C6's cancel/complete
    /// transitions.
    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: ReservationId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, client_id, vehicle_id, address_id, status, cancelled_by,
                   total_minutes, note, created_at, updated_at, confirmation_token, token_expires_at
            FROM reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
    }

    /// `Reservation.lock_by_token` (C2), used by `confirm_by_token`.
    pub async fn lock_by_token(
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, client_id, vehicle_id, address_id, status, cancelled_by,
                   total_minutes, note, created_at, updated_at, confirmation_token, token_expires_at
            FROM reservations
            WHERE confirmation_token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn issue_confirmation_token(
        tx: &mut Transaction<'_, Postgres>,
        id: ReservationId,
        status: ReservationStatus,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET status = $2, confirmation_token = $3, token_expires_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status)
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn set_status_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: ReservationId,
        status: ReservationStatus,
        cancelled_by: Option<shared::types::CancelledBy>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET status = $2, cancelled_by = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status)
        .bind(cancelled_by)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn clear_confirmation_token(
        tx: &mut Transaction<'_, Postgres>,
        id: ReservationId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE reservations SET confirmation_token = NULL, token_expires_at = NULL WHERE id = $1"#,
        )
        .bind(id.as_uuid())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Every reservation currently sitting in `WaitingClient` whose token
    /// has already expired, for the collapsed expiry sweeper.
    pub async fn find_expired_waiting_client(
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, client_id, vehicle_id, address_id, status, cancelled_by,
                   total_minutes, note, created_at, updated_at, confirmation_token, token_expires_at
            FROM reservations
            WHERE status = 'waiting_client' AND token_expires_at IS NOT NULL AND token_expires_at <= $1
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// C4 step 5 / C5 daily-load input: count of active reservations
    /// (`ReservationStatus::is_active`: PENDING, WAITING_CLIENT, CONFIRMED,
    /// RECONFIRMED, IN_PROGRESS) with at least one slot for this
    /// professional on this date. Named positively rather than as a
    /// terminal-status exclusion so NO_SHOW — terminal but not cancelled —
    /// is correctly left out of the daily load.
    pub async fn count_active_for_professional_on_date(
        pool: &PgPool,
        professional_id: ProfessionalId,
        date: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT r.id)
            FROM reservations r
            JOIN reservation_slots rs ON rs.reservation_id = r.id
            JOIN slots s ON s.id = rs.slot_id
            WHERE rs.professional_id = $1
              AND s.date = $2
              AND r.status IN ('pending', 'waiting_client', 'confirmed', 'reconfirmed', 'in_progress')
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(date)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// C5 pending-duplicate check (§4.5): a PENDING reservation already
    /// exists for a client matched by `email` (case-insensitive) OR
    /// `phone`.
    pub async fn find_pending_duplicate_by_contact(
        pool: &PgPool,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            r#"
            SELECT r.id, r.client_id, r.vehicle_id, r.address_id, r.status, r.cancelled_by,
                   r.total_minutes, r.note, r.created_at, r.updated_at, r.confirmation_token, r.token_expires_at
            FROM reservations r
            JOIN clients c ON c.id = r.client_id
            WHERE r.status = 'pending'
              AND (lower(c.email) = lower($1) OR ($2::text IS NOT NULL AND c.phone = $2))
            ORDER BY r.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_optional(pool)
        .await
    }
}
