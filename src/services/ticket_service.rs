//! Ticket lifecycle: creation with per-tenant sequential numbering,
//! status transitions with derived timestamps, visibility-guarded reads,
//! comments and aggregate statistics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    NewLogEntry, Role, Ticket, TicketComment, TicketPriority, TicketStatus,
};
use crate::error::{ApiError, ApiResult};
use crate::services::{AccessResolver, Caller};
use crate::store::{NewTicket, Store};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub category_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
}

/// Guest submissions carry contact fields instead of a creator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGuestTicket {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub category_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Serialize)]
pub struct TicketStats {
    pub total: i64,
    pub by_status: HashMap<String, i64>,
    pub by_priority: HashMap<String, i64>,
    pub by_category: HashMap<String, i64>,
    pub by_assignee: HashMap<String, i64>,
    pub unassigned: i64,
    pub overdue: i64,
    pub due_soon: i64,
    pub avg_resolution_hours: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct BrandTicketCount {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub brand: Option<String>,
    pub tenant_type: String,
    pub ticket_count: i64,
}

/// Window for the "due soon" stats bucket.
const DUE_SOON_HOURS: i64 = 48;

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn Store>,
    resolver: AccessResolver,
}

impl TicketService {
    pub fn new(store: Arc<dyn Store>, resolver: AccessResolver) -> Self {
        Self { store, resolver }
    }

    /// Create a ticket on behalf of an authenticated caller. The sequential
    /// number is assigned inside the store's atomic insert.
    pub async fn create(&self, dto: CreateTicket, caller_user_id: Uuid) -> ApiResult<Ticket> {
        let user = self
            .store
            .user_by_id(caller_user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        self.check_category_in_tenant(dto.category_id, user.tenant_id)
            .await?;
        if let Some(assignee_id) = dto.assignee_id {
            self.check_assignee_in_tenant(assignee_id, user.tenant_id)
                .await?;
        }

        let ticket = self
            .store
            .insert_ticket_numbered(NewTicket {
                title: dto.title,
                description: dto.description,
                priority: dto.priority.unwrap_or(TicketPriority::Medium),
                due_date: dto.due_date,
                tenant_id: user.tenant_id,
                category_id: dto.category_id,
                creator_id: Some(user.id),
                assignee_id: dto.assignee_id,
                guest_name: None,
                guest_email: None,
                guest_phone: None,
            })
            .await?;

        self.store
            .insert_log(
                NewLogEntry::new(
                    "TICKET_CREATED",
                    "TICKET",
                    ticket.id,
                    format!("Ticket #{} '{}' created", ticket.number, ticket.title),
                    ticket.tenant_id,
                )
                .by_user(user.id)
                .for_ticket(ticket.id),
            )
            .await?;

        tracing::info!(tenant = %ticket.tenant_id, number = %ticket.number, "ticket created");
        Ok(ticket)
    }

    /// Guest-submitted ticket for a tenant resolved from the request path.
    /// Contact fields are mandatory since there is no creator to reach.
    pub async fn create_guest(
        &self,
        tenant_id: Uuid,
        dto: CreateGuestTicket,
    ) -> ApiResult<Ticket> {
        let guest_name = dto
            .guest_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::validation("Guest name is required"))?;
        let guest_email = dto
            .guest_email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ApiError::validation("Guest email is required"))?;

        self.check_category_in_tenant(dto.category_id, tenant_id)
            .await?;

        let ticket = self
            .store
            .insert_ticket_numbered(NewTicket {
                title: dto.title,
                description: dto.description,
                priority: dto.priority.unwrap_or(TicketPriority::Medium),
                due_date: dto.due_date,
                tenant_id,
                category_id: dto.category_id,
                creator_id: None,
                assignee_id: None,
                guest_name: Some(guest_name),
                guest_email: Some(guest_email),
                guest_phone: dto.guest_phone,
            })
            .await?;

        self.store
            .insert_log(
                NewLogEntry::new(
                    "TICKET_CREATED",
                    "TICKET",
                    ticket.id,
                    format!("Guest ticket #{} '{}' created", ticket.number, ticket.title),
                    ticket.tenant_id,
                )
                .for_ticket(ticket.id),
            )
            .await?;

        Ok(ticket)
    }

    /// Tickets of one tenant, visibility-guarded.
    pub async fn list_for_tenant(&self, tenant_id: Uuid, caller: Caller) -> ApiResult<Vec<Ticket>> {
        self.resolver
            .ensure_can_access_tenant(&caller, tenant_id)
            .await?;
        Ok(self.store.tickets_by_tenant(tenant_id).await?)
    }

    /// Every ticket in the caller's accessible tenant set.
    pub async fn list_all(&self, caller: Caller) -> ApiResult<Vec<Ticket>> {
        let tenant_ids = self.resolver.accessible_tenant_ids(&caller).await?;
        Ok(self.store.tickets_by_tenants(&tenant_ids).await?)
    }

    /// All tickets for one brand. Narrow roles may only ask for their own
    /// tenant's brand.
    pub async fn list_by_brand(&self, brand: &str, caller: Caller) -> ApiResult<Vec<Ticket>> {
        if matches!(caller.role, Role::FranchiseAdmin | Role::Agent | Role::User) {
            let own = self
                .store
                .tenant_by_id(caller.tenant_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
            if own.brand.as_deref() != Some(brand) {
                return Err(ApiError::forbidden(
                    "You do not have permission to view tickets of this brand",
                ));
            }
        }

        let tenants = self.store.tenants_by_brand(brand).await?;
        let tenant_ids: Vec<Uuid> = tenants.iter().map(|t| t.id).collect();
        Ok(self.store.tickets_by_tenants(&tenant_ids).await?)
    }

    /// Fetch one ticket. `NotFound` only when no such ticket exists at
    /// all; a ticket outside the caller's boundary is `Forbidden`.
    pub async fn get(&self, id: Uuid, caller: Caller) -> ApiResult<Ticket> {
        let ticket = self
            .store
            .ticket_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Ticket not found"))?;
        self.resolver
            .ensure_can_access_tenant(&caller, ticket.tenant_id)
            .await?;
        Ok(ticket)
    }

    pub async fn update(&self, id: Uuid, dto: UpdateTicket, caller: Caller) -> ApiResult<Ticket> {
        let mut ticket = self.get(id, caller).await?;
        self.resolver.ensure_can_update_ticket(&caller, &ticket)?;

        if let Some(assignee_id) = dto.assignee_id {
            self.check_assignee_in_tenant(assignee_id, ticket.tenant_id)
                .await?;
        }
        if let Some(category_id) = dto.category_id {
            self.check_category_in_tenant(category_id, ticket.tenant_id)
                .await?;
        }

        let old_status = ticket.status;

        if let Some(title) = dto.title {
            ticket.title = title;
        }
        if let Some(description) = dto.description {
            ticket.description = description;
        }
        if let Some(priority) = dto.priority {
            ticket.priority = priority;
        }
        if let Some(due_date) = dto.due_date {
            ticket.due_date = Some(due_date);
        }
        if let Some(category_id) = dto.category_id {
            ticket.category_id = category_id;
        }
        if let Some(assignee_id) = dto.assignee_id {
            ticket.assignee_id = Some(assignee_id);
        }
        if let Some(rating) = dto.rating {
            ticket.rating = Some(rating);
        }
        if let Some(feedback) = dto.feedback {
            ticket.feedback = Some(feedback);
        }
        if let Some(status) = dto.status {
            ticket.transition_to(status, Utc::now());
        }
        ticket.updated_at = Utc::now();

        let ticket = self.store.update_ticket(ticket).await?;

        if ticket.status != old_status {
            self.store
                .insert_log(
                    NewLogEntry::new(
                        "STATUS_CHANGED",
                        "TICKET",
                        ticket.id,
                        format!(
                            "Ticket #{} moved from {} to {}",
                            ticket.number, old_status, ticket.status
                        ),
                        ticket.tenant_id,
                    )
                    .by_user(caller.user_id)
                    .for_ticket(ticket.id)
                    .change(old_status.as_str(), ticket.status.as_str()),
                )
                .await?;
        } else {
            self.store
                .insert_log(
                    NewLogEntry::new(
                        "TICKET_UPDATED",
                        "TICKET",
                        ticket.id,
                        format!("Ticket #{} updated", ticket.number),
                        ticket.tenant_id,
                    )
                    .by_user(caller.user_id)
                    .for_ticket(ticket.id),
                )
                .await?;
        }

        Ok(ticket)
    }

    /// Delete a ticket and its comments. The audit trail stays.
    pub async fn remove(&self, id: Uuid, caller: Caller) -> ApiResult<()> {
        let ticket = self.get(id, caller).await?;
        self.resolver.ensure_can_delete_ticket(&caller)?;

        self.store.delete_ticket(id).await?;
        self.store
            .insert_log(
                NewLogEntry::new(
                    "TICKET_DELETED",
                    "TICKET",
                    ticket.id,
                    format!("Ticket #{} '{}' deleted", ticket.number, ticket.title),
                    ticket.tenant_id,
                )
                .by_user(caller.user_id),
            )
            .await?;
        Ok(())
    }

    pub async fn add_comment(
        &self,
        ticket_id: Uuid,
        dto: NewComment,
        caller: Caller,
    ) -> ApiResult<TicketComment> {
        let ticket = self.get(ticket_id, caller).await?;

        if caller.role == Role::User && dto.is_internal {
            return Err(ApiError::forbidden(
                "You do not have permission to post internal comments",
            ));
        }

        let comment = TicketComment {
            id: Uuid::new_v4(),
            content: dto.content,
            is_internal: dto.is_internal,
            ticket_id: ticket.id,
            author_id: caller.user_id,
            tenant_id: ticket.tenant_id,
            created_at: Utc::now(),
        };
        let comment = self.store.insert_comment(comment).await?;

        self.store
            .insert_log(
                NewLogEntry::new(
                    "COMMENT_ADDED",
                    "TICKET_COMMENT",
                    comment.id,
                    format!("Comment added to ticket #{}", ticket.number),
                    ticket.tenant_id,
                )
                .by_user(caller.user_id)
                .for_ticket(ticket.id),
            )
            .await?;

        Ok(comment)
    }

    /// Comments in chronological order; the requester view (USER role)
    /// never sees internal comments.
    pub async fn list_comments(
        &self,
        ticket_id: Uuid,
        caller: Caller,
    ) -> ApiResult<Vec<TicketComment>> {
        self.get(ticket_id, caller).await?;
        let comments = self.store.comments_by_ticket(ticket_id).await?;
        if caller.role == Role::User {
            Ok(comments.into_iter().filter(|c| !c.is_internal).collect())
        } else {
            Ok(comments)
        }
    }

    /// Aggregate counts over the caller's accessible tenant set.
    pub async fn stats(&self, caller: Caller) -> ApiResult<TicketStats> {
        let tenant_ids = self.resolver.accessible_tenant_ids(&caller).await?;
        let tickets = self.store.tickets_by_tenants(&tenant_ids).await?;
        let now = Utc::now();
        let due_soon_cutoff = now + Duration::hours(DUE_SOON_HOURS);

        let mut by_status: HashMap<String, i64> = HashMap::new();
        let mut by_priority: HashMap<String, i64> = HashMap::new();
        let mut by_category_id: HashMap<Uuid, i64> = HashMap::new();
        let mut by_assignee_id: HashMap<Uuid, i64> = HashMap::new();
        let mut unassigned = 0;
        let mut overdue = 0;
        let mut due_soon = 0;
        let mut resolution_hours: Vec<f64> = Vec::new();

        for ticket in &tickets {
            *by_status.entry(ticket.status.as_str().to_string()).or_insert(0) += 1;
            *by_priority
                .entry(ticket.priority.as_str().to_string())
                .or_insert(0) += 1;
            *by_category_id.entry(ticket.category_id).or_insert(0) += 1;

            match ticket.assignee_id {
                Some(assignee) => *by_assignee_id.entry(assignee).or_insert(0) += 1,
                None => unassigned += 1,
            }

            if let Some(due) = ticket.due_date {
                if ticket.status.is_active() {
                    if due < now {
                        overdue += 1;
                    } else if due <= due_soon_cutoff {
                        due_soon += 1;
                    }
                }
            }

            if let Some(resolved_at) = ticket.resolved_at {
                let hours = (resolved_at - ticket.created_at).num_minutes() as f64 / 60.0;
                resolution_hours.push(hours);
            }
        }

        let category_names = try_join_all(by_category_id.keys().map(|&id| async move {
            self.store.category_by_id(id).await.map(|c| (id, c))
        }))
        .await?;
        let mut by_category: HashMap<String, i64> = HashMap::new();
        for (id, category) in category_names {
            let name = category.map(|c| c.name).unwrap_or_else(|| id.to_string());
            by_category.insert(name, by_category_id.get(&id).copied().unwrap_or(0));
        }

        let assignee_names = try_join_all(by_assignee_id.keys().map(|&id| async move {
            self.store.user_by_id(id).await.map(|u| (id, u))
        }))
        .await?;
        let mut by_assignee: HashMap<String, i64> = HashMap::new();
        for (id, user) in assignee_names {
            let name = user.map(|u| u.name).unwrap_or_else(|| id.to_string());
            by_assignee.insert(name, by_assignee_id.get(&id).copied().unwrap_or(0));
        }

        let avg_resolution_hours = if resolution_hours.is_empty() {
            None
        } else {
            Some(resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64)
        };

        Ok(TicketStats {
            total: tickets.len() as i64,
            by_status,
            by_priority,
            by_category,
            by_assignee,
            unassigned,
            overdue,
            due_soon,
            avg_resolution_hours,
        })
    }

    /// Per-tenant ticket counts across brands; crown and franchisor
    /// admins only.
    pub async fn stats_by_brand(&self, caller: Caller) -> ApiResult<Vec<BrandTicketCount>> {
        self.resolver.ensure_can_view_cross_brand(&caller)?;

        let tenants = self.resolver.accessible_tenants(&caller).await?;
        let tenant_ids: Vec<Uuid> = tenants.iter().map(|t| t.id).collect();
        let tickets = self.store.tickets_by_tenants(&tenant_ids).await?;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for ticket in &tickets {
            *counts.entry(ticket.tenant_id).or_insert(0) += 1;
        }

        let mut result: Vec<BrandTicketCount> = tenants
            .into_iter()
            .map(|t| BrandTicketCount {
                ticket_count: counts.get(&t.id).copied().unwrap_or(0),
                tenant_id: t.id,
                tenant_name: t.name,
                brand: t.brand,
                tenant_type: t.tenant_type.as_str().to_string(),
            })
            .collect();
        result.sort_by(|a, b| b.ticket_count.cmp(&a.ticket_count));
        Ok(result)
    }

    async fn check_category_in_tenant(&self, category_id: Uuid, tenant_id: Uuid) -> ApiResult<()> {
        match self.store.category_by_id(category_id).await? {
            Some(category) if category.tenant_id == tenant_id => Ok(()),
            _ => Err(ApiError::validation(
                "Category not found or does not belong to this tenant",
            )),
        }
    }

    async fn check_assignee_in_tenant(&self, assignee_id: Uuid, tenant_id: Uuid) -> ApiResult<()> {
        match self.store.user_by_id(assignee_id).await? {
            Some(user) if user.tenant_id == tenant_id => Ok(()),
            _ => Err(ApiError::validation(
                "Assignee not found or does not belong to this tenant",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Tenant, TenantType, User};
    use crate::store::MemoryStore;

    struct Fixture {
        service: TicketService,
        store: Arc<MemoryStore>,
        franchisor: Tenant,
        franchise: Tenant,
        unrelated: Tenant,
        franchisor_admin: User,
        franchise_user: User,
        other_franchise_user: User,
        franchise_agent: User,
        category: Uuid,
        unrelated_category: Uuid,
    }

    fn make_tenant(slug: &str, tenant_type: TenantType, brand: &str, parent: Option<Uuid>) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            tax_id: format!("tax-{}", slug),
            slug: slug.to_string(),
            domain: None,
            tenant_type,
            brand: Some(brand.to_string()),
            segment: None,
            is_active: true,
            parent_tenant_id: parent,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_user(tenant_id: Uuid, role: Role, email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: email.to_string(),
            email: email.to_string(),
            password_hash: "x".to_string(),
            role,
            tenant_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn make_category(store: &MemoryStore, tenant_id: Uuid, name: &str) -> Uuid {
        use crate::domain::TicketCategory;
        use crate::store::CategoryStore;
        let now = Utc::now();
        let category = TicketCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            color: None,
            icon: None,
            sla_hours: None,
            is_active: true,
            tenant_id,
            created_at: now,
            updated_at: now,
        };
        store.insert_category(category.clone()).await.unwrap();
        category.id
    }

    async fn fixture() -> Fixture {
        use crate::store::{TenantStore, UserStore};
        let store = Arc::new(MemoryStore::new());

        let franchisor = make_tenant("lacoste-matriz", TenantType::Franchisor, "Lacoste", None);
        let franchise = make_tenant(
            "lacoste-loja-shopping",
            TenantType::Franchise,
            "Lacoste",
            Some(franchisor.id),
        );
        let unrelated = make_tenant("mcdonalds-matriz", TenantType::Franchisor, "McDonalds", None);
        for t in [&franchisor, &franchise, &unrelated] {
            store.insert_tenant((*t).clone()).await.unwrap();
        }

        let franchisor_admin = make_user(franchisor.id, Role::FranchisorAdmin, "admin@lacoste.com");
        let franchise_user = make_user(franchise.id, Role::User, "user@loja.com");
        let other_franchise_user = make_user(franchise.id, Role::User, "user2@loja.com");
        let franchise_agent = make_user(franchise.id, Role::Agent, "agent@loja.com");
        for u in [
            &franchisor_admin,
            &franchise_user,
            &other_franchise_user,
            &franchise_agent,
        ] {
            store.insert_user((*u).clone()).await.unwrap();
        }

        let category = make_category(&store, franchise.id, "Support").await;
        let unrelated_category = make_category(&store, unrelated.id, "Support").await;

        let resolver = AccessResolver::new(store.clone());
        Fixture {
            service: TicketService::new(store.clone(), resolver),
            store,
            franchisor,
            franchise,
            unrelated,
            franchisor_admin,
            franchise_user,
            other_franchise_user,
            franchise_agent,
            category,
            unrelated_category,
        }
    }

    fn caller_of(user: &User) -> Caller {
        Caller {
            user_id: user.id,
            role: user.role,
            tenant_id: user.tenant_id,
        }
    }

    fn create_dto(category_id: Uuid) -> CreateTicket {
        CreateTicket {
            title: "Login broken".to_string(),
            description: "Error 500 on login".to_string(),
            priority: None,
            category_id,
            due_date: None,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn numbers_are_sequential_and_padded() {
        let f = fixture().await;
        let t1 = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let t2 = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        assert_eq!(t1.number, "001");
        assert_eq!(t2.number, "002");
        assert_eq!(t1.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn deleting_newest_ticket_does_not_reuse_its_number() {
        let f = fixture().await;
        let _t1 = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let t2 = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        f.service
            .remove(t2.id, caller_of(&f.franchisor_admin))
            .await
            .unwrap();
        // max(number)+1 keeps counting past the deleted ticket
        let t3 = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        assert_eq!(t3.number, "003");
    }

    #[tokio::test]
    async fn unknown_creator_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .create(create_dto(f.category), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn cross_tenant_category_fails_validation() {
        let f = fixture().await;
        let err = f
            .service
            .create(create_dto(f.unrelated_category), f.franchise_user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn franchisor_admin_lists_child_franchise_tickets() {
        // Scenario: parent brand admin reading a franchise's tickets
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let listed = f
            .service
            .list_for_tenant(f.franchise.id, caller_of(&f.franchisor_admin))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, ticket.id);
    }

    #[tokio::test]
    async fn franchisor_admin_denied_on_unrelated_tenant() {
        let f = fixture().await;
        let err = f
            .service
            .list_for_tenant(f.unrelated.id, caller_of(&f.franchisor_admin))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn get_distinguishes_missing_from_forbidden() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();

        // Exists but outside the caller's boundary: forbidden
        let outsider = Caller {
            user_id: Uuid::new_v4(),
            role: Role::FranchisorAdmin,
            tenant_id: f.unrelated.id,
        };
        let err = f.service.get(ticket.id, outsider).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Does not exist at all: not found
        let err = f
            .service
            .get(Uuid::new_v4(), caller_of(&f.franchise_user))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn user_cannot_update_someone_elses_ticket() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let err = f
            .service
            .update(
                ticket.id,
                UpdateTicket {
                    title: Some("hijack".to_string()),
                    ..Default::default()
                },
                caller_of(&f.other_franchise_user),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn user_updates_own_ticket() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let updated = f
            .service
            .update(
                ticket.id,
                UpdateTicket {
                    description: Some("more detail".to_string()),
                    ..Default::default()
                },
                caller_of(&f.franchise_user),
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "more detail");
    }

    #[tokio::test]
    async fn resolved_timestamp_set_once() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let admin = caller_of(&f.franchisor_admin);

        let first = f
            .service
            .update(
                ticket.id,
                UpdateTicket {
                    status: Some(TicketStatus::Resolved),
                    ..Default::default()
                },
                admin,
            )
            .await
            .unwrap();
        let stamp = first.resolved_at.expect("resolved_at should be stamped");

        let second = f
            .service
            .update(
                ticket.id,
                UpdateTicket {
                    status: Some(TicketStatus::Resolved),
                    ..Default::default()
                },
                admin,
            )
            .await
            .unwrap();
        assert_eq!(second.resolved_at, Some(stamp));
    }

    #[tokio::test]
    async fn assignee_must_belong_to_ticket_tenant() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        // The franchisor admin belongs to the parent tenant, not the
        // franchise that owns the ticket
        let err = f
            .service
            .update(
                ticket.id,
                UpdateTicket {
                    assignee_id: Some(f.franchisor_admin.id),
                    ..Default::default()
                },
                caller_of(&f.franchisor_admin),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let ok = f
            .service
            .update(
                ticket.id,
                UpdateTicket {
                    assignee_id: Some(f.franchise_agent.id),
                    ..Default::default()
                },
                caller_of(&f.franchisor_admin),
            )
            .await
            .unwrap();
        assert_eq!(ok.assignee_id, Some(f.franchise_agent.id));
    }

    #[tokio::test]
    async fn agent_cannot_delete_tickets() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let err = f
            .service
            .remove(ticket.id, caller_of(&f.franchise_agent))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_cascades_comments_but_keeps_logs() {
        use crate::store::{CommentStore, LogStore};
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        f.service
            .add_comment(
                ticket.id,
                NewComment {
                    content: "working on it".to_string(),
                    is_internal: false,
                },
                caller_of(&f.franchise_agent),
            )
            .await
            .unwrap();

        f.service
            .remove(ticket.id, caller_of(&f.franchisor_admin))
            .await
            .unwrap();

        let comments = f.store.comments_by_ticket(ticket.id).await.unwrap();
        assert!(comments.is_empty());
        let logs = f.store.logs_by_ticket(ticket.id).await.unwrap();
        assert!(!logs.is_empty(), "audit trail must survive deletion");
    }

    #[tokio::test]
    async fn requester_view_hides_internal_comments() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let agent = caller_of(&f.franchise_agent);
        f.service
            .add_comment(
                ticket.id,
                NewComment {
                    content: "public note".to_string(),
                    is_internal: false,
                },
                agent,
            )
            .await
            .unwrap();
        f.service
            .add_comment(
                ticket.id,
                NewComment {
                    content: "internal note".to_string(),
                    is_internal: true,
                },
                agent,
            )
            .await
            .unwrap();

        let requester_view = f
            .service
            .list_comments(ticket.id, caller_of(&f.franchise_user))
            .await
            .unwrap();
        assert_eq!(requester_view.len(), 1);
        assert_eq!(requester_view[0].content, "public note");

        let agent_view = f.service.list_comments(ticket.id, agent).await.unwrap();
        assert_eq!(agent_view.len(), 2);
    }

    #[tokio::test]
    async fn guest_ticket_requires_contact_fields() {
        let f = fixture().await;
        let err = f
            .service
            .create_guest(
                f.franchise.id,
                CreateGuestTicket {
                    title: "t".to_string(),
                    description: "d".to_string(),
                    priority: None,
                    category_id: f.category,
                    due_date: None,
                    guest_name: Some("Joao".to_string()),
                    guest_email: None,
                    guest_phone: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let ticket = f
            .service
            .create_guest(
                f.franchise.id,
                CreateGuestTicket {
                    title: "t".to_string(),
                    description: "d".to_string(),
                    priority: None,
                    category_id: f.category,
                    due_date: None,
                    guest_name: Some("Joao".to_string()),
                    guest_email: Some("joao@email.com".to_string()),
                    guest_phone: None,
                },
            )
            .await
            .unwrap();
        assert!(ticket.creator_id.is_none());
        assert_eq!(ticket.number, "001");
    }

    #[tokio::test]
    async fn stats_cover_accessible_set() {
        let f = fixture().await;
        let admin = caller_of(&f.franchisor_admin);
        f.service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        let t2 = f
            .service
            .create(create_dto(f.category), f.franchise_user.id)
            .await
            .unwrap();
        f.service
            .update(
                t2.id,
                UpdateTicket {
                    status: Some(TicketStatus::Resolved),
                    ..Default::default()
                },
                admin,
            )
            .await
            .unwrap();

        let stats = f.service.stats(admin).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_status.get("OPEN"), Some(&1));
        assert_eq!(stats.by_status.get("RESOLVED"), Some(&1));
        assert_eq!(stats.unassigned, 2);
        assert!(stats.avg_resolution_hours.is_some());

        // Narrow roles are refused the cross-brand aggregate view
        let err = f
            .service
            .stats_by_brand(caller_of(&f.franchise_agent))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let brand_stats = f.service.stats_by_brand(admin).await.unwrap();
        let franchise_row = brand_stats
            .iter()
            .find(|row| row.tenant_id == f.franchise.id)
            .unwrap();
        assert_eq!(franchise_row.ticket_count, 2);
    }
}
