use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket category, scoped to one tenant. Name is unique per tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// Target resolution time for tickets in this category.
    pub sla_hours: Option<i32>,
    pub is_active: bool,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
