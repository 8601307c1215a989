use domain::masking::should_update_contact_field;
use shared::types::{AddressId, ClientId, CommuneId, VehicleId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::{Address, Client, Commune, Vehicle};

pub struct ClientRepository;

impl ClientRepository {
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"SELECT id, email, first_name, last_name, phone FROM clients WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_phone_suffix(
        pool: &PgPool,
        suffix: &str,
    ) -> Result<Vec<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT id, email, first_name, last_name, phone
            FROM clients
            WHERE phone IS NOT NULL AND right(phone, length($1::text)) = $1
            "#,
        )
        .bind(suffix)
        .fetch_all(pool)
        .await
    }

    /// C5 step 1: upsert a client by email, applying the masking
    /// heuristics so a redacted chat-sourced value never clobbers a known
    /// real one.
    pub async fn upsert_by_email_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<Client, sqlx::Error> {
        if let Some(existing) = sqlx::query_as::<_, Client>(
            r#"SELECT id, email, first_name, last_name, phone FROM clients WHERE email = $1 FOR UPDATE"#,
        )
        .bind(email)
        .fetch_optional(&mut **tx)
        .await?
        {
            let new_first_name = if should_update_contact_field(&existing.first_name, first_name) {
                first_name
            } else {
                existing.first_name.as_str()
            };
            let new_last_name = if should_update_contact_field(&existing.last_name, last_name) {
                last_name
            } else {
                existing.last_name.as_str()
            };
            let new_phone = match phone {
                Some(p) if should_update_contact_field(existing.phone.as_deref().unwrap_or(""), p) => Some(p),
                _ => existing.phone.as_deref(),
            };

            sqlx::query_as::<_, Client>(
                r#"
                UPDATE clients SET first_name = $2, last_name = $3, phone = $4
                WHERE id = $1
                RETURNING id, email, first_name, last_name, phone
                "#,
            )
            .bind(existing.id.as_uuid())
            .bind(new_first_name)
            .bind(new_last_name)
            .bind(new_phone)
            .fetch_one(&mut **tx)
            .await
        } else {
            let id = ClientId::new();
            sqlx::query_as::<_, Client>(
                r#"
                INSERT INTO clients (id, email, first_name, last_name, phone)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, first_name, last_name, phone
                "#,
            )
            .bind(id.as_uuid())
            .bind(email)
            .bind(first_name)
            .bind(last_name)
            .bind(phone)
            .fetch_one(&mut **tx)
            .await
        }
    }
}

pub struct VehicleRepository;

impl VehicleRepository {
    /// Upsert by `(owner, plate)`. A blank or masked plate is skipped
    /// entirely by the caller before reaching this method.
    pub async fn upsert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: ClientId,
        plate: &str,
        brand: Option<&str>,
        model: Option<&str>,
        year: Option<i32>,
    ) -> Result<Vehicle, sqlx::Error> {
        if let Some(existing) = sqlx::query_as::<_, Vehicle>(
            r#"SELECT id, owner_id, plate, brand, model, year FROM vehicles WHERE owner_id = $1 AND plate = $2 FOR UPDATE"#,
        )
        .bind(owner_id.as_uuid())
        .bind(plate)
        .fetch_optional(&mut **tx)
        .await?
        {
            sqlx::query_as::<_, Vehicle>(
                r#"
                UPDATE vehicles SET brand = COALESCE($3, brand), model = COALESCE($4, model), year = COALESCE($5, year)
                WHERE id = $1 AND owner_id = $2
                RETURNING id, owner_id, plate, brand, model, year
                "#,
            )
            .bind(existing.id.as_uuid())
            .bind(owner_id.as_uuid())
            .bind(brand)
            .bind(model)
            .bind(year)
            .fetch_one(&mut **tx)
            .await
        } else {
            let id = VehicleId::new();
            sqlx::query_as::<_, Vehicle>(
                r#"
                INSERT INTO vehicles (id, owner_id, plate, brand, model, year)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, owner_id, plate, brand, model, year
                "#,
            )
            .bind(id.as_uuid())
            .bind(owner_id.as_uuid())
            .bind(plate)
            .bind(brand)
            .bind(model)
            .bind(year)
            .fetch_one(&mut **tx)
            .await
        }
    }
}

pub struct AddressRepository;

impl AddressRepository {
    /// Upsert by `(owner, alias)`.
    pub async fn upsert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        owner_id: ClientId,
        alias: &str,
        street: &str,
        number: &str,
        complement: Option<&str>,
        commune_id: CommuneId,
    ) -> Result<Address, sqlx::Error> {
        if let Some(existing) = sqlx::query_as::<_, Address>(
            r#"SELECT id, owner_id, alias, street, number, complement, commune_id FROM addresses WHERE owner_id = $1 AND alias = $2 FOR UPDATE"#,
        )
        .bind(owner_id.as_uuid())
        .bind(alias)
        .fetch_optional(&mut **tx)
        .await?
        {
            sqlx::query_as::<_, Address>(
                r#"
                UPDATE addresses SET street = $3, number = $4, complement = $5, commune_id = $6
                WHERE id = $1 AND owner_id = $2
                RETURNING id, owner_id, alias, street, number, complement, commune_id
                "#,
            )
            .bind(existing.id.as_uuid())
            .bind(owner_id.as_uuid())
            .bind(street)
            .bind(number)
            .bind(complement)
            .bind(commune_id.as_uuid())
            .fetch_one(&mut **tx)
            .await
        } else {
            let id = AddressId::new();
            sqlx::query_as::<_, Address>(
                r#"
                INSERT INTO addresses (id, owner_id, alias, street, number, complement, commune_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, owner_id, alias, street, number, complement, commune_id
                "#,
            )
            .bind(id.as_uuid())
            .bind(owner_id.as_uuid())
            .bind(alias)
            .bind(street)
            .bind(number)
            .bind(complement)
            .bind(commune_id.as_uuid())
            .fetch_one(&mut **tx)
            .await
        }
    }
}

pub struct CommuneRepository;

impl CommuneRepository {
    pub async fn find_by_id(pool: &PgPool, id: CommuneId) -> Result<Option<Commune>, sqlx::Error> {
        sqlx::query_as::<_, Commune>(r#"SELECT id, name FROM communes WHERE id = $1"#)
            .bind(id.as_uuid())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name_ci(pool: &PgPool, name: &str) -> Result<Option<Commune>, sqlx::Error> {
        sqlx::query_as::<_, Commune>(r#"SELECT id, name FROM communes WHERE lower(name) = lower($1)"#)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Full list used by the chat FSM's address parser to match the
    /// longest commune-name suffix against free text.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Commune>, sqlx::Error> {
        sqlx::query_as::<_, Commune>(r#"SELECT id, name FROM communes ORDER BY name"#)
            .fetch_all(pool)
            .await
    }
}
