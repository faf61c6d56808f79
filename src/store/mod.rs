use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    LogEntry, NewLogEntry, Tenant, Ticket, TicketCategory, TicketComment, TicketPriority, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage-level error type. Uniqueness violations surface as `Conflict`,
/// missing rows as `NotFound`; everything else is an opaque backend error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("record not found".to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Input for ticket creation. The store assigns id, sequential number,
/// initial status and timestamps.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
}

#[async_trait]
pub trait TenantStore {
    async fn insert_tenant(&self, tenant: Tenant) -> StoreResult<Tenant>;
    async fn update_tenant(&self, tenant: Tenant) -> StoreResult<Tenant>;
    async fn delete_tenant(&self, id: Uuid) -> StoreResult<()>;
    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>>;
    async fn tenant_by_slug(&self, slug: &str) -> StoreResult<Option<Tenant>>;
    async fn tenant_by_tax_id(&self, tax_id: &str) -> StoreResult<Option<Tenant>>;
    async fn tenant_by_domain(&self, domain: &str) -> StoreResult<Option<Tenant>>;
    /// All tenants, newest first.
    async fn tenants_all(&self) -> StoreResult<Vec<Tenant>>;
    /// Direct children of a tenant, ordered by name.
    async fn tenants_by_parent(&self, parent_id: Uuid) -> StoreResult<Vec<Tenant>>;
    async fn tenants_by_brand(&self, brand: &str) -> StoreResult<Vec<Tenant>>;
    async fn tenants_by_segment(&self, segment: &str) -> StoreResult<Vec<Tenant>>;
    async fn first_tenant_of_type(
        &self,
        tenant_type: crate::domain::TenantType,
    ) -> StoreResult<Option<Tenant>>;
}

#[async_trait]
pub trait UserStore {
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// Emails are unique per tenant, not globally; every credential
    /// lookup must be tenant-scoped.
    async fn user_by_email_in_tenant(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait TicketStore {
    /// Compute `max(number) + 1` for the tenant and insert in one atomic
    /// unit. Two concurrent calls for the same tenant must never both
    /// succeed with the same number.
    async fn insert_ticket_numbered(&self, new: NewTicket) -> StoreResult<Ticket>;
    async fn ticket_by_id(&self, id: Uuid) -> StoreResult<Option<Ticket>>;
    /// Tickets of one tenant, newest first.
    async fn tickets_by_tenant(&self, tenant_id: Uuid) -> StoreResult<Vec<Ticket>>;
    /// Tickets across a set of tenants, newest first.
    async fn tickets_by_tenants(&self, tenant_ids: &[Uuid]) -> StoreResult<Vec<Ticket>>;
    async fn update_ticket(&self, ticket: Ticket) -> StoreResult<Ticket>;
    /// Removes the ticket and cascades to its comments. Audit log entries
    /// are untouched.
    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()>;
    async fn count_tickets_in_category(&self, category_id: Uuid) -> StoreResult<i64>;
}

#[async_trait]
pub trait CategoryStore {
    async fn insert_category(&self, category: TicketCategory) -> StoreResult<TicketCategory>;
    async fn category_by_id(&self, id: Uuid) -> StoreResult<Option<TicketCategory>>;
    async fn category_by_name_in_tenant(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<TicketCategory>>;
    /// Categories of a tenant ordered by name; optionally active only.
    async fn categories_by_tenant(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> StoreResult<Vec<TicketCategory>>;
    async fn update_category(&self, category: TicketCategory) -> StoreResult<TicketCategory>;
    async fn delete_category(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait CommentStore {
    async fn insert_comment(&self, comment: TicketComment) -> StoreResult<TicketComment>;
    /// Comments of a ticket in chronological order.
    async fn comments_by_ticket(&self, ticket_id: Uuid) -> StoreResult<Vec<TicketComment>>;
}

#[async_trait]
pub trait LogStore {
    async fn insert_log(&self, entry: NewLogEntry) -> StoreResult<LogEntry>;
    /// Entries for a tenant, newest first.
    async fn logs_by_tenant(&self, tenant_id: Uuid) -> StoreResult<Vec<LogEntry>>;
    async fn logs_by_ticket(&self, ticket_id: Uuid) -> StoreResult<Vec<LogEntry>>;
    async fn logs_by_user(&self, user_id: Uuid) -> StoreResult<Vec<LogEntry>>;
}

/// The full persistence seam the services are built against.
pub trait Store:
    TenantStore + UserStore + TicketStore + CategoryStore + CommentStore + LogStore + Send + Sync
{
}

impl<T> Store for T where
    T: TenantStore + UserStore + TicketStore + CategoryStore + CommentStore + LogStore + Send + Sync
{
}
