use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only ticket comment. Comments are never edited or deleted;
/// internal comments are hidden from the requester view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketComment {
    pub id: Uuid,
    pub content: String,
    pub is_internal: bool,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
}
