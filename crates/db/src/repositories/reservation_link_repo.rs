use chrono::Utc;
use shared::types::{ProfessionalId, ReservationId, ReservationStatus, ServiceId, SlotId};
use sqlx::{Postgres, Transaction};

use crate::models::{ReservationService, ReservationSlot, StatusHistory};

pub struct ReservationSlotRepository;

impl ReservationSlotRepository {
    pub async fn link_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        reservation_id: ReservationId,
        slot_id: SlotId,
        professional_id: ProfessionalId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reservation_slots (reservation_id, slot_id, professional_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(reservation_id.as_uuid())
        .bind(slot_id.as_uuid())
        .bind(professional_id.as_uuid())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_for_reservation_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        reservation_id: ReservationId,
    ) -> Result<Vec<ReservationSlot>, sqlx::Error> {
        sqlx::query_as::<_, ReservationSlot>(
            r#"
            SELECT reservation_id, slot_id, professional_id
            FROM reservation_slots
            WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id.as_uuid())
        .fetch_all(&mut **tx)
        .await
    }
}

pub struct ReservationServiceRepository;

impl ReservationServiceRepository {
    pub async fn link_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        reservation_id: ReservationId,
        service_id: ServiceId,
        professional_id: ProfessionalId,
        effective_duration_minutes: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reservation_services (reservation_id, service_id, professional_id, effective_duration_minutes)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reservation_id.as_uuid())
        .bind(service_id.as_uuid())
        .bind(professional_id.as_uuid())
        .bind(effective_duration_minutes)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_for_reservation(
        pool: &sqlx::PgPool,
        reservation_id: ReservationId,
    ) -> Result<Vec<ReservationService>, sqlx::Error> {
        sqlx::query_as::<_, ReservationService>(
            r#"
            SELECT reservation_id, service_id, professional_id, effective_duration_minutes
            FROM reservation_services
            WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id.as_uuid())
        .fetch_all(pool)
        .await
    }
}

pub struct StatusHistoryRepository;

impl StatusHistoryRepository {
    pub async fn append_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        reservation_id: ReservationId,
        status: ReservationStatus,
        note: Option<String>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO status_history (reservation_id, status, timestamp, note)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reservation_id.as_uuid())
        .bind(status)
        .bind(Utc::now())
        .bind(note)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_for_reservation(
        pool: &sqlx::PgPool,
        reservation_id: ReservationId,
    ) -> Result<Vec<StatusHistory>, sqlx::Error> {
        sqlx::query_as::<_, StatusHistory>(
            r#"
            SELECT reservation_id, status, timestamp, note
            FROM status_history
            WHERE reservation_id = $1
            ORDER BY timestamp
            "#,
        )
        .bind(reservation_id.as_uuid())
        .fetch_all(pool)
        .await
    }
}
