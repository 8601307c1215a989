use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::ChatState;
use sqlx::FromRow;

/// One phone number's chat conversation state, keyed by `phone` (no
/// separate id — the phone number *is* the identity, matching the source
/// system's `WhatsAppSession`). `data` is a free-form JSON bag the C8
/// parsing functions read/write structured fields from/to
/// (`domain::chat_fsm::ChatSessionData` is the typed view of it).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatSession {
    pub phone: String,
    pub state: ChatState,
    pub data: sqlx::types::Json<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}
