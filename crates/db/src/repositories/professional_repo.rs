use std::collections::{HashMap, HashSet};

use chrono::NaiveTime;
use shared::types::{BreakId, ProfessionalId, ProfessionalServiceId, ServiceId, WorkScheduleId};
use sqlx::PgPool;

use crate::models::{Break, Professional, ProfessionalService, WorkSchedule};

pub struct ProfessionalRepository;

impl ProfessionalRepository {
    pub async fn find_by_id(pool: &PgPool, id: ProfessionalId) -> Result<Option<Professional>, sqlx::Error> {
        sqlx::query_as::<_, Professional>(
            r#"
            SELECT id, display_name, active, accepts_reservations, linked_user_id
            FROM professionals
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(pool)
        .await
    }

    pub async fn find_active_accepting_reservations(
        pool: &PgPool,
    ) -> Result<Vec<Professional>, sqlx::Error> {
        sqlx::query_as::<_, Professional>(
            r#"
            SELECT id, display_name, active, accepts_reservations, linked_user_id
            FROM professionals
            WHERE active = TRUE AND accepts_reservations = TRUE
            ORDER BY display_name
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

pub struct ProfessionalServiceRepository;

impl ProfessionalServiceRepository {
    /// Step 1 of the availability calculator: the set of active
    /// professionals assigned to one service.
    pub async fn qualified_professional_ids(
        pool: &PgPool,
        service_id: ServiceId,
    ) -> Result<HashSet<ProfessionalId>, sqlx::Error> {
        let rows: Vec<(uuid::Uuid,)> = sqlx::query_as(
            r#"
            SELECT ps.professional_id
            FROM professional_services ps
            JOIN professionals p ON p.id = ps.professional_id
            WHERE ps.service_id = $1
              AND ps.active = TRUE
              AND p.active = TRUE
              AND p.accepts_reservations = TRUE
            "#,
        )
        .bind(service_id.as_uuid())
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| ProfessionalId::from_uuid(id)).collect())
    }

    /// Prefetch every `(professional, service)` assignment relevant to a
    /// booking or availability query in one round trip, eliminating the
    /// N+1 lookup the design notes call out for C4's per-professional
    /// duration computation.
    pub async fn find_for_professionals_and_services(
        pool: &PgPool,
        professional_ids: &[ProfessionalId],
        service_ids: &[ServiceId],
    ) -> Result<HashMap<(ProfessionalId, ServiceId), ProfessionalService>, sqlx::Error> {
        if professional_ids.is_empty() || service_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let pro_uuids: Vec<uuid::Uuid> = professional_ids.iter().map(|p| *p.as_uuid()).collect();
        let svc_uuids: Vec<uuid::Uuid> = service_ids.iter().map(|s| *s.as_uuid()).collect();

        let rows = sqlx::query_as::<_, ProfessionalService>(
            r#"
            SELECT id, professional_id, service_id, duration_override_minutes, active
            FROM professional_services
            WHERE professional_id = ANY($1) AND service_id = ANY($2) AND active = TRUE
            "#,
        )
        .bind(&pro_uuids)
        .bind(&svc_uuids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ((row.professional_id, row.service_id), row))
            .collect())
    }

    pub async fn find_one(
        pool: &PgPool,
        professional_id: ProfessionalId,
        service_id: ServiceId,
    ) -> Result<Option<ProfessionalService>, sqlx::Error> {
        sqlx::query_as::<_, ProfessionalService>(
            r#"
            SELECT id, professional_id, service_id, duration_override_minutes, active
            FROM professional_services
            WHERE professional_id = $1 AND service_id = $2 AND active = TRUE
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(service_id.as_uuid())
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        professional_id: ProfessionalId,
        service_id: ServiceId,
        duration_override_minutes: Option<i32>,
    ) -> Result<ProfessionalService, sqlx::Error> {
        let id = ProfessionalServiceId::new();
        sqlx::query_as::<_, ProfessionalService>(
            r#"
            INSERT INTO professional_services (id, professional_id, service_id, duration_override_minutes, active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, professional_id, service_id, duration_override_minutes, active
            "#,
        )
        .bind(id.as_uuid())
        .bind(professional_id.as_uuid())
        .bind(service_id.as_uuid())
        .bind(duration_override_minutes)
        .fetch_one(pool)
        .await
    }
}

pub struct WorkScheduleRepository;

impl WorkScheduleRepository {
    pub async fn find_active_for_weekday(
        pool: &PgPool,
        professional_id: ProfessionalId,
        weekday: i16,
    ) -> Result<Option<WorkSchedule>, sqlx::Error> {
        sqlx::query_as::<_, WorkSchedule>(
            r#"
            SELECT id, professional_id, weekday, start_time, end_time, active
            FROM work_schedules
            WHERE professional_id = $1 AND weekday = $2 AND active = TRUE
            "#,
        )
        .bind(professional_id.as_uuid())
        .bind(weekday)
        .fetch_optional(pool)
        .await
    }

    /// Seed the default Mon-Fri 09:00-18:00 + Sat 09:00-14:00 schedule for
    /// a newly onboarded professional (`create_default_schedule` in the
    /// source, carried per `SPEC_FULL.md` §5.1).
    pub async fn create_default_schedule(
        pool: &PgPool,
        professional_id: ProfessionalId,
    ) -> Result<Vec<WorkSchedule>, sqlx::Error> {
        let weekday_hours: [(i16, NaiveTime, NaiveTime); 6] = [
            (0, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            (1, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            (2, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            (3, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            (4, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            (5, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(14, 0, 0).unwrap()),
        ];

        let mut created = Vec::with_capacity(weekday_hours.len());
        for (weekday, start, end) in weekday_hours {
            let id = WorkScheduleId::new();
            let row = sqlx::query_as::<_, WorkSchedule>(
                r#"
                INSERT INTO work_schedules (id, professional_id, weekday, start_time, end_time, active)
                VALUES ($1, $2, $3, $4, $5, TRUE)
                ON CONFLICT (professional_id, weekday) DO UPDATE SET active = work_schedules.active
                RETURNING id, professional_id, weekday, start_time, end_time, active
                "#,
            )
            .bind(id.as_uuid())
            .bind(professional_id.as_uuid())
            .bind(weekday)
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await?;
            created.push(row);
        }
        Ok(created)
    }
}

pub struct BreakRepository;

impl BreakRepository {
    pub async fn find_for_work_schedule(
        pool: &PgPool,
        work_schedule_id: WorkScheduleId,
    ) -> Result<Vec<Break>, sqlx::Error> {
        sqlx::query_as::<_, Break>(
            r#"
            SELECT id, work_schedule_id, start_time, end_time
            FROM breaks
            WHERE work_schedule_id = $1
            "#,
        )
        .bind(work_schedule_id.as_uuid())
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        work_schedule_id: WorkScheduleId,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Break, sqlx::Error> {
        let id = BreakId::new();
        sqlx::query_as::<_, Break>(
            r#"
            INSERT INTO breaks (id, work_schedule_id, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, work_schedule_id, start_time, end_time
            "#,
        )
        .bind(id.as_uuid())
        .bind(work_schedule_id.as_uuid())
        .bind(start_time)
        .bind(end_time)
        .fetch_one(pool)
        .await
    }
}
