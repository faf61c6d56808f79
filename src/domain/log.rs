use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit record owned by the tenant whose data changed.
/// Log entries are written as a side effect of mutating operations and
/// survive deletion of the entities they describe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub action: String,
    pub entity: String,
    pub entity_id: Uuid,
    pub message: String,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub action: String,
    pub entity: String,
    pub entity_id: Uuid,
    pub message: String,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl NewLogEntry {
    pub fn new(
        action: impl Into<String>,
        entity: impl Into<String>,
        entity_id: Uuid,
        message: impl Into<String>,
        tenant_id: Uuid,
    ) -> Self {
        Self {
            action: action.into(),
            entity: entity.into(),
            entity_id,
            message: message.into(),
            tenant_id,
            user_id: None,
            ticket_id: None,
            old_value: None,
            new_value: None,
        }
    }

    pub fn by_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn for_ticket(mut self, ticket_id: Uuid) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    pub fn change(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_value = Some(old.into());
        self.new_value = Some(new.into());
        self
    }
}
