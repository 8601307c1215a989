use chrono::Utc;
use shared::types::ChatState;
use sqlx::PgPool;

use crate::models::ChatSession;

pub struct ChatSessionRepository;

impl ChatSessionRepository {
    pub async fn get_or_create(pool: &PgPool, phone: &str) -> Result<ChatSession, sqlx::Error> {
        if let Some(existing) = Self::find(pool, phone).await? {
            return Ok(existing);
        }
        sqlx::query_as::<_, ChatSession>(
            r#"
            INSERT INTO chat_sessions (phone, state, data, updated_at)
            VALUES ($1, 'menu', '{}'::jsonb, $2)
            ON CONFLICT (phone) DO UPDATE SET phone = chat_sessions.phone
            RETURNING phone, state, data, updated_at
            "#,
        )
        .bind(phone)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find(pool: &PgPool, phone: &str) -> Result<Option<ChatSession>, sqlx::Error> {
        sqlx::query_as::<_, ChatSession>(
            r#"SELECT phone, state, data, updated_at FROM chat_sessions WHERE phone = $1"#,
        )
        .bind(phone)
        .fetch_optional(pool)
        .await
    }

    pub async fn save(
        pool: &PgPool,
        phone: &str,
        state: ChatState,
        data: serde_json::Value,
    ) -> Result<ChatSession, sqlx::Error> {
        sqlx::query_as::<_, ChatSession>(
            r#"
            UPDATE chat_sessions SET state = $2, data = $3, updated_at = $4
            WHERE phone = $1
            RETURNING phone, state, data, updated_at
            "#,
        )
        .bind(phone)
        .bind(state)
        .bind(sqlx::types::Json(data))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Reset a session back to MENU, dropping any in-progress booking
    /// data — used by the global `menu`/`cancel` commands.
    pub async fn reset_to_menu(pool: &PgPool, phone: &str) -> Result<ChatSession, sqlx::Error> {
        Self::save(pool, phone, ChatState::Menu, serde_json::json!({})).await
    }
}
