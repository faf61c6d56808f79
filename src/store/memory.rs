//! In-memory store used by the test suite and local development.
//!
//! Every table lives behind its own `RwLock`; the ticket-numbering
//! critical section holds the ticket table's write lock across the
//! max-scan and the insert, which makes the "compute next number +
//! insert" sequence atomic per process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    LogEntry, NewLogEntry, Tenant, TenantType, Ticket, TicketCategory, TicketComment, TicketStatus,
    User,
};
use crate::store::{
    CategoryStore, CommentStore, LogStore, NewTicket, StoreError, StoreResult, TenantStore,
    TicketStore, UserStore,
};

#[derive(Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<Uuid, Tenant>>,
    users: RwLock<HashMap<Uuid, User>>,
    tickets: RwLock<HashMap<Uuid, Ticket>>,
    /// Per-tenant numbering high-water mark. Survives ticket deletion,
    /// so a number is never handed out twice even after the row holding
    /// the current max is removed.
    ticket_counters: RwLock<HashMap<Uuid, u32>>,
    categories: RwLock<HashMap<Uuid, TicketCategory>>,
    comments: RwLock<HashMap<Uuid, TicketComment>>,
    logs: RwLock<HashMap<Uuid, LogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn insert_tenant(&self, tenant: Tenant) -> StoreResult<Tenant> {
        let mut tenants = self.tenants.write().await;
        tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant(&self, tenant: Tenant) -> StoreResult<Tenant> {
        let mut tenants = self.tenants.write().await;
        if !tenants.contains_key(&tenant.id) {
            return Err(StoreError::NotFound("tenant not found".to_string()));
        }
        tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn delete_tenant(&self, id: Uuid) -> StoreResult<()> {
        let mut tenants = self.tenants.write().await;
        tenants
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("tenant not found".to_string()))
    }

    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        Ok(self.tenants.read().await.get(&id).cloned())
    }

    async fn tenant_by_slug(&self, slug: &str) -> StoreResult<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn tenant_by_tax_id(&self, tax_id: &str) -> StoreResult<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|t| t.tax_id == tax_id)
            .cloned())
    }

    async fn tenant_by_domain(&self, domain: &str) -> StoreResult<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|t| t.domain.as_deref() == Some(domain))
            .cloned())
    }

    async fn tenants_all(&self) -> StoreResult<Vec<Tenant>> {
        let mut all: Vec<Tenant> = self.tenants.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn tenants_by_parent(&self, parent_id: Uuid) -> StoreResult<Vec<Tenant>> {
        let mut children: Vec<Tenant> = self
            .tenants
            .read()
            .await
            .values()
            .filter(|t| t.parent_tenant_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn tenants_by_brand(&self, brand: &str) -> StoreResult<Vec<Tenant>> {
        let mut matched: Vec<Tenant> = self
            .tenants
            .read()
            .await
            .values()
            .filter(|t| t.brand.as_deref() == Some(brand))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn tenants_by_segment(&self, segment: &str) -> StoreResult<Vec<Tenant>> {
        let mut matched: Vec<Tenant> = self
            .tenants
            .read()
            .await
            .values()
            .filter(|t| t.segment.as_deref() == Some(segment))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn first_tenant_of_type(&self, tenant_type: TenantType) -> StoreResult<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|t| t.tenant_type == tenant_type)
            .cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn user_by_email_in_tenant(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.tenant_id == tenant_id && u.email == email)
            .cloned())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket_numbered(&self, new: NewTicket) -> StoreResult<Ticket> {
        // Both write locks held from the read through the insert: the
        // numbering invariant depends on no other insert interleaving.
        let mut tickets = self.tickets.write().await;
        let mut counters = self.ticket_counters.write().await;
        let live_max = tickets
            .values()
            .filter(|t| t.tenant_id == new.tenant_id)
            .filter_map(|t| Ticket::numeric_value(&t.number))
            .max()
            .unwrap_or(0);
        // The counter is the high-water mark; the live max only matters
        // for data that predates the counter.
        let next = live_max.max(*counters.get(&new.tenant_id).unwrap_or(&0)) + 1;
        counters.insert(new.tenant_id, next);

        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            number: Ticket::format_number(next),
            title: new.title,
            description: new.description,
            status: TicketStatus::Open,
            priority: new.priority,
            due_date: new.due_date,
            tenant_id: new.tenant_id,
            category_id: new.category_id,
            creator_id: new.creator_id,
            assignee_id: new.assignee_id,
            guest_name: new.guest_name,
            guest_email: new.guest_email,
            guest_phone: new.guest_phone,
            resolved_at: None,
            closed_at: None,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn ticket_by_id(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn tickets_by_tenant(&self, tenant_id: Uuid) -> StoreResult<Vec<Ticket>> {
        self.tickets_by_tenants(&[tenant_id]).await
    }

    async fn tickets_by_tenants(&self, tenant_ids: &[Uuid]) -> StoreResult<Vec<Ticket>> {
        let mut matched: Vec<Ticket> = self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| tenant_ids.contains(&t.tenant_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.number.cmp(&a.number)));
        Ok(matched)
    }

    async fn update_ticket(&self, ticket: Ticket) -> StoreResult<Ticket> {
        let mut tickets = self.tickets.write().await;
        if !tickets.contains_key(&ticket.id) {
            return Err(StoreError::NotFound("ticket not found".to_string()));
        }
        tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn delete_ticket(&self, id: Uuid) -> StoreResult<()> {
        let mut tickets = self.tickets.write().await;
        tickets
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound("ticket not found".to_string()))?;
        // Cascade to comments; audit log entries stay
        let mut comments = self.comments.write().await;
        comments.retain(|_, c| c.ticket_id != id);
        Ok(())
    }

    async fn count_tickets_in_category(&self, category_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| t.category_id == category_id)
            .count() as i64)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, category: TicketCategory) -> StoreResult<TicketCategory> {
        let mut categories = self.categories.write().await;
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn category_by_id(&self, id: Uuid) -> StoreResult<Option<TicketCategory>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn category_by_name_in_tenant(
        &self,
        tenant_id: Uuid,
        name: &str,
    ) -> StoreResult<Option<TicketCategory>> {
        Ok(self
            .categories
            .read()
            .await
            .values()
            .find(|c| c.tenant_id == tenant_id && c.name == name)
            .cloned())
    }

    async fn categories_by_tenant(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> StoreResult<Vec<TicketCategory>> {
        let mut matched: Vec<TicketCategory> = self
            .categories
            .read()
            .await
            .values()
            .filter(|c| c.tenant_id == tenant_id && (!active_only || c.is_active))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn update_category(&self, category: TicketCategory) -> StoreResult<TicketCategory> {
        let mut categories = self.categories.write().await;
        if !categories.contains_key(&category.id) {
            return Err(StoreError::NotFound("category not found".to_string()));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<()> {
        let mut categories = self.categories.write().await;
        categories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("category not found".to_string()))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: TicketComment) -> StoreResult<TicketComment> {
        let mut comments = self.comments.write().await;
        comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comments_by_ticket(&self, ticket_id: Uuid) -> StoreResult<Vec<TicketComment>> {
        let mut matched: Vec<TicketComment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matched)
    }
}

#[async_trait]
impl LogStore for MemoryStore {
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
        let mut logs = self.logs.write().await;
        logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn logs_by_tenant(&self, tenant_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        let mut matched: Vec<LogEntry> = self
            .logs
            .read()
            .await
            .values()
            .filter(|l| l.tenant_id == tenant_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn logs_by_ticket(&self, ticket_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        let mut matched: Vec<LogEntry> = self
            .logs
            .read()
            .await
            .values()
            .filter(|l| l.ticket_id == Some(ticket_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn logs_by_user(&self, user_id: Uuid) -> StoreResult<Vec<LogEntry>> {
        let mut matched: Vec<LogEntry> = self
            .logs
            .read()
            .await
            .values()
            .filter(|l| l.user_id == Some(user_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}
