//! Postgres-backed store.
//!
//! All queries are runtime-bound (`sqlx::query_as`) against the schema in
//! `migrations/`. Enum-valued columns are stored as text in the wire form
//! of the domain enums. The ticket-numbering critical section runs inside
//! a transaction under a per-tenant advisory lock, with a bounded retry
//! loop for serialization conflicts.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config;
use crate::domain::{
    LogEntry, NewLogEntry, Role, Tenant, TenantType, Ticket, TicketCategory, TicketComment,
    TicketPriority, TicketStatus, User,
};
use crate::store::{
    CategoryStore, CommentStore, LogStore, NewTicket, StoreError, StoreResult, TenantStore,
    TicketStore, UserStore,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the application config and run pending migrations.
    pub async fn connect() -> StoreResult<Self> {
        let cfg = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(cfg.connection_timeout_secs))
            .connect(&cfg.url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Advisory lock key scoped to one tenant, so concurrent creates on
/// unrelated tenants never contend.
fn tenant_lock_key(tenant_id: Uuid) -> i64 {
    let bytes = tenant_id.as_bytes();
    i64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

fn is_serialization_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40001") | Some("40P01")),
        _ => false,
    }
}

fn parse_field<T: FromStr>(value: &str, what: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| StoreError::Backend(format!("corrupt {} column: {}", what, e)))
}

#[derive(FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    tax_id: String,
    slug: String,
    domain: Option<String>,
    tenant_type: String,
    brand: Option<String>,
    segment: Option<String>,
    is_active: bool,
    parent_tenant_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = StoreError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            id: row.id,
            name: row.name,
            tax_id: row.tax_id,
            slug: row.slug,
            domain: row.domain,
            tenant_type: parse_field::<TenantType>(&row.tenant_type, "tenant_type")?,
            brand: row.brand,
            segment: row.segment,
            is_active: row.is_active,
            parent_tenant_id: row.parent_tenant_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    tenant_id: Uuid,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_field::<Role>(&row.role, "role")?,
            tenant_id: row.tenant_id,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TicketRow {
    id: Uuid,
    number: String,
    title: String,
    description: String,
    status: String,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    tenant_id: Uuid,
    category_id: Uuid,
    creator_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    guest_phone: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    rating: Option<i32>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            number: row.number,
            title: row.title,
            description: row.description,
            status: parse_field::<TicketStatus>(&row.status, "status")?,
            priority: parse_field::<TicketPriority>(&row.priority, "priority")?,
            due_date: row.due_date,
            tenant_id: row.tenant_id,
            category_id: row.category_id,
            creator_id: row.creator_id,
            assignee_id: row.assignee_id,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            guest_phone: row.guest_phone,
            resolved_at: row.resolved_at,
            closed_at: row.closed_at,
            rating: row.rating,
            feedback: row.feedback,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    color: Option<String>,
    icon: Option<String>,
    sla_hours: Option<i32>,
    is_active: bool,
    tenant_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for TicketCategory {
    fn from(row: CategoryRow) -> Self {
        TicketCategory {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            icon: row.icon,
            sla_hours: row.sla_hours,
            is_active: row.is_active,
            tenant_id: row.tenant_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    content: String,
    is_internal: bool,
    ticket_id: Uuid,
    author_id: Uuid,
    tenant_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for TicketComment {
    fn from(row: CommentRow) -> Self {
        TicketComment {
            id: row.id,
            content: row.content,
            is_internal: row.is_internal,
            ticket_id: row.ticket_id,
            author_id: row.author_id,
            tenant_id: row.tenant_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct LogRow {
    id: Uuid,
    action: String,
    entity: String,
    entity_id: Uuid,
    message: String,
    tenant_id: Uuid,
    user_id: Option<Uuid>,
    ticket_id: Option<Uuid>,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LogRow> for LogEntry {
    fn from(row: LogRow) -> Self {
        LogEntry {
            id: row.id,
            action: row.action,
            entity: row.entity,
            entity_id: row.entity_id,
            message: row.message,
            tenant_id: row.tenant_id,
            user_id: row.user_id,
            ticket_id: row.ticket_id,
            old_value: row.old_value,
            new_value: row.new_value,
            created_at: row.created_at,
        }
    }
}

const TENANT_COLS: &str = "id, name, tax_id, slug, domain, tenant_type, brand, segment, is_active, parent_tenant_id, created_at, updated_at";
const TICKET_COLS: &str = "id, number, title, description, status, priority, due_date, tenant_id, category_id, creator_id, assignee_id, guest_name, guest_email, guest_phone, resolved_at, closed_at, rating, feedback, created_at, updated_at";

#[async_trait]
impl TenantStore for PgStore {
    async fn insert_tenant(&self, tenant: Tenant) -> StoreResult<Tenant> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, tax_id, slug, domain, tenant_type, brand, segment, is_active, parent_tenant_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.tax_id)
        .bind(&tenant.slug)
        .bind(&tenant.domain)
        .bind(tenant.tenant_type.as_str())
        .bind(&tenant.brand)
        .bind(&tenant.segment)
        .bind(tenant.is_active)
        .bind(tenant.parent_tenant_id)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn update_tenant(&self, tenant: Tenant) -> StoreResult<Tenant> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET name = $2, tax_id = $3, slug = $4, domain = $5, brand = $6,
                segment = $7, is_active = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.tax_id)
        .bind(&tenant.slug)
        .bind(&tenant.domain)
        .bind(&tenant.brand)
        .bind(&tenant.segment)
        .bind(tenant.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("tenant not found".to_string()));
        }
        Ok(tenant)
    }

    async fn delete_tenant(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("tenant not found".to_string()));
        }
        Ok(())
    }

    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE id = $1",
            TENANT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tenant::try_from).transpose()
    }

    async fn tenant_by_slug(&self, slug: &str) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE slug = $1",
            TENANT_COLS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tenant::try_from).transpose()
    }

    async fn tenant_by_tax_id(&self, tax_id: &str) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE tax_id = $1",
            TENANT_COLS
        ))
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tenant::try_from).transpose()
    }

    async fn tenant_by_domain(&self, domain: &str) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE domain = $1",
            TENANT_COLS
        ))
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tenant::try_from).transpose()
    }

    async fn tenants_all(&self) -> StoreResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants ORDER BY created_at DESC",
            TENANT_COLS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn tenants_by_parent(&self, parent_id: Uuid) -> StoreResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE parent_tenant_id = $1 ORDER BY name ASC",
            TENANT_COLS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn tenants_by_brand(&self, brand: &str) -> StoreResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE brand = $1 ORDER BY name ASC",
            TENANT_COLS
        ))
        .bind(brand)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn tenants_by_segment(&self, segment: &str) -> StoreResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE segment = $1 ORDER BY name ASC",
            TENANT_COLS
        ))
        .bind(segment)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn first_tenant_of_type(&self, tenant_type: TenantType) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {} FROM tenants WHERE tenant_type = $1 ORDER BY created_at ASC LIMIT 1",
            TENANT_COLS
        ))
        .bind(tenant_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Tenant::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, tenant_id, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.tenant_id)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_email_in_tenant(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let row =
            sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE tenant_id = $1 AND email = $2")
                .bind(tenant_id)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket_numbered(&self, new: NewTicket) -> StoreResult<Ticket> {
        let retries = config::config().database.numbering_retries;
        let mut attempt = 0;
        loop {
            match self.try_insert_numbered(&new).await {
                Ok(ticket) => return Ok(ticket),
                Err(StoreError::Backend(ref msg)) if attempt < retries => {
                    // Recompute the number on a fresh transaction after a
                    // serialization conflict; anything else is terminal.
                    if msg.contains("serialization") || msg.contains("deadlock") {
                        attempt += 1;
                        tracing::warn!(
                            tenant = %new.tenant_id,
                            attempt,
                            "ticket numbering conflict, retrying"
                        );
                        continue;
                    }
                    return Err(StoreError::Backend(msg.clone()));
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn ticket_by_id(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Ticket::try_from).transpose()
    }

    async fn tickets_by_tenant(&self, tenant_id: Uuid) -> StoreResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE tenant_id = $1 ORDER BY created_at DESC",
            TICKET_COLS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn tickets_by_tenants(&self, tenant_ids: &[Uuid]) -> StoreResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE tenant_id = ANY($1) ORDER BY created_at DESC",
            TICKET_COLS
        ))
        .bind(tenant_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn update_ticket(&self, ticket: Ticket) -> StoreResult<Ticket> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET title = $2, description = $3, status = $4, priority = $5,
                due_date = $6, category_id = $7, assignee_id = $8,
                resolved_at = $9, closed_at = $10, rating = $11, feedback = $12,
                updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.due_date)
        .bind(ticket.category_id)
        .bind(ticket.assignee_id)
        .bind(ticket.resolved_at)
        .bind(ticket.closed_at)
        .bind(ticket.rating)
        .bind(&ticket.feedback)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("ticket not found".to_string()));
        }
        Ok(ticket)
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()> {
        // Comments cascade via FK; logs intentionally do not reference
        // tickets with a cascading FK.
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("ticket not found".to_string()));
        }
        Ok(())
    }

    async fn count_tickets_in_category(&self, category_id: Uuid) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

impl PgStore {
    async fn try_insert_numbered(&self, new: &NewTicket) -> StoreResult<Ticket> {
        let mut tx = self.pool.begin().await?;

        // Tenant-scoped mutual exclusion for the max+insert sequence
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(tenant_lock_key(new.tenant_id))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_serialization_conflict(&e) {
                    StoreError::Backend("serialization conflict".to_string())
                } else {
                    StoreError::from(e)
                }
            })?;

        let counter: Option<i64> =
            sqlx::query_scalar("SELECT last_number FROM ticket_counters WHERE tenant_id = $1")
                .bind(new.tenant_id)
                .fetch_optional(&mut *tx)
                .await?;
        // Live max only matters for data predating the counter row; the
        // counter itself never shrinks, so deleted numbers stay burned.
        let live_max: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(number::bigint) FROM tickets
            WHERE tenant_id = $1 AND number ~ '^[0-9]+$'
            "#,
        )
        .bind(new.tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        let next = counter.unwrap_or(0).max(live_max.unwrap_or(0)) + 1;
        let number = u32::try_from(next)
            .map(Ticket::format_number)
            .map_err(|_| StoreError::Backend("ticket counter overflow".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO ticket_counters (tenant_id, last_number)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id) DO UPDATE SET last_number = EXCLUDED.last_number
            "#,
        )
        .bind(new.tenant_id)
        .bind(next)
        .execute(&mut *tx)
        .await?;

        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            number,
            title: new.title.clone(),
            description: new.description.clone(),
            status: TicketStatus::Open,
            priority: new.priority,
            due_date: new.due_date,
            tenant_id: new.tenant_id,
            category_id: new.category_id,
            creator_id: new.creator_id,
            assignee_id: new.assignee_id,
            guest_name: new.guest_name.clone(),
            guest_email: new.guest_email.clone(),
            guest_phone: new.guest_phone.clone(),
            resolved_at: None,
            closed_at: None,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO tickets (id, number, title, description, status, priority, due_date,
                                 tenant_id, category_id, creator_id, assignee_id,
                                 guest_name, guest_email, guest_phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(ticket.id)
        .bind(&ticket.number)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.due_date)
        .bind(ticket.tenant_id)
        .bind(ticket.category_id)
        .bind(ticket.creator_id)
        .bind(ticket.assignee_id)
        .bind(&ticket.guest_name)
        .bind(&ticket.guest_email)
        .bind(&ticket.guest_phone)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_serialization_conflict(&e) {
                StoreError::Backend("serialization conflict".to_string())
            } else {
                StoreError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(ticket)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn insert_category(&self, category: TicketCategory) -> StoreResult<TicketCategory> {
        sqlx::query(
            r#"
            INSERT INTO ticket_categories (id, name, description, color, icon, sla_hours, is_active, tenant_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.sla_hours)
        .bind(category.is_active)
        .bind(category.tenant_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(category)
    }

    async fn category_by_id(&self, id: Uuid) -> StoreResult<Option<TicketCategory>> {
        let row =
            sqlx::query_as::<_, CategoryRow>("SELECT * FROM ticket_categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(TicketCategory::from))
    }

    async fn category_by_name_in_tenant(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<TicketCategory>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM ticket_categories WHERE tenant_id = $1 AND name = $2",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TicketCategory::from))
    }

    async fn categories_by_tenant(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> StoreResult<Vec<TicketCategory>> {
        let sql = if active_only {
            "SELECT * FROM ticket_categories WHERE tenant_id = $1 AND is_active = true ORDER BY name ASC"
        } else {
            "SELECT * FROM ticket_categories WHERE tenant_id = $1 ORDER BY name ASC"
        };
        let rows = sqlx::query_as::<_, CategoryRow>(sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(TicketCategory::from).collect())
    }

    async fn update_category(&self, category: TicketCategory) -> StoreResult<TicketCategory> {
        let result = sqlx::query(
            r#"
            UPDATE ticket_categories
            SET name = $2, description = $3, color = $4, icon = $5,
                sla_hours = $6, is_active = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.sla_hours)
        .bind(category.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("category not found".to_string()));
        }
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM ticket_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("category not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(&self, comment: TicketComment) -> StoreResult<TicketComment> {
        sqlx::query(
            r#"
            INSERT INTO ticket_comments (id, content, is_internal, ticket_id, author_id, tenant_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.is_internal)
        .bind(comment.ticket_id)
        .bind(comment.author_id)
        .bind(comment.tenant_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn comments_by_ticket(&self, ticket_id: Uuid) -> StoreResult<Vec<TicketComment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT * FROM ticket_comments WHERE ticket_id = $1 ORDER BY created_at ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TicketComment::from).collect())
    }
}

#[async_trait]
impl LogStore for PgStore {
    async fn insert_log(&self, entry: NewLogEntry) -> StoreResult<LogEntry> {
        let log = LogEntry {
            id: Uuid::new_v4(),
            action: entry.action,
            entity: entry.entity,
            entity_id: entry.entity_id,
            message: entry.message,
            tenant_id: entry.tenant_id,
            user_id: entry.user_id,
            ticket_id: entry.ticket_id,
            old_value: entry.old_value,
            new_value: entry.new_value,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"
            INSERT INTO logs (id, action, entity, entity_id, message, tenant_id, user_id, ticket_id, old_value, new_value, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(log.id)
        .bind(&log.action)
        .bind(&log.entity)
        .bind(log.entity_id)
        .bind(&log.message)
        .bind(log.tenant_id)
        .bind(log.user_id)
        .bind(log.ticket_id)
        .bind(&log.old_value)
        .bind(&log.new_value)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;
        Ok(log)
    }

    async fn logs_by_tenant(&self, tenant_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM logs WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LogEntry::from).collect())
    }

    async fn logs_by_ticket(&self, ticket_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM logs WHERE ticket_id = $1 ORDER BY created_at DESC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LogEntry::from).collect())
    }

    async fn logs_by_user(&self, user_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM logs WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LogEntry::from).collect())
    }
}
