//! Read side of the audit trail. Entries are written by the other
//! services as a side effect of mutations; this service only guards
//! who may read which slice.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{LogEntry, NewLogEntry};
use crate::error::{ApiError, ApiResult};
use crate::services::{AccessResolver, Caller};
use crate::store::Store;

#[derive(Clone)]
pub struct LogService {
    store: Arc<dyn Store>,
    resolver: AccessResolver,
}

impl LogService {
    pub fn new(store: Arc<dyn Store>, resolver: AccessResolver) -> Self {
        Self { store, resolver }
    }

    pub async fn record(&self, entry: NewLogEntry) -> ApiResult<LogEntry> {
        Ok(self.store.insert_log(entry).await?)
    }

    /// Audit entries of one tenant, newest first.
    pub async fn list_for_tenant(
        &self,
        tenant_id: Uuid,
        caller: Caller,
    ) -> ApiResult<Vec<LogEntry>> {
        self.resolver
            .ensure_can_access_tenant(&caller, tenant_id)
            .await?;
        Ok(self.store.logs_by_tenant(tenant_id).await?)
    }

    /// History of one ticket. Works for deleted tickets too, which is
    /// the point of keeping the trail unlinked, so access is checked
    /// against the tenant recorded on the entries themselves.
    pub async fn list_for_ticket(
        &self,
        ticket_id: Uuid,
        caller: Caller,
    ) -> ApiResult<Vec<LogEntry>> {
        let entries = self.store.logs_by_ticket(ticket_id).await?;
        match entries.first() {
            Some(first) => {
                self.resolver
                    .ensure_can_access_tenant(&caller, first.tenant_id)
                    .await?;
                Ok(entries)
            }
            None => Err(ApiError::not_found("No log entries for this ticket")),
        }
    }

    /// Actions performed by one user, restricted to tenants the caller
    /// can see.
    pub async fn list_for_user(&self, user_id: Uuid, caller: Caller) -> ApiResult<Vec<LogEntry>> {
        let tenant_ids = self.resolver.accessible_tenant_ids(&caller).await?;
        let entries = self.store.logs_by_user(user_id).await?;
        Ok(entries
            .into_iter()
            .filter(|e| tenant_ids.contains(&e.tenant_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Tenant, TenantType};
    use crate::store::{MemoryStore, TenantStore};
    use chrono::Utc;

    async fn seed_tenant(store: &MemoryStore, slug: &str) -> Tenant {
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            tax_id: format!("tax-{}", slug),
            slug: slug.to_string(),
            domain: None,
            tenant_type: TenantType::Franchisor,
            brand: None,
            segment: None,
            is_active: true,
            parent_tenant_id: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_tenant(tenant.clone()).await.unwrap();
        tenant
    }

    #[tokio::test]
    async fn ticket_history_readable_after_ticket_is_gone() {
        let store = Arc::new(MemoryStore::new());
        let tenant = seed_tenant(&store, "lacoste-matriz").await;
        let service = LogService::new(store.clone(), AccessResolver::new(store.clone()));

        let ticket_id = Uuid::new_v4();
        service
            .record(
                NewLogEntry::new(
                    "TICKET_DELETED",
                    "TICKET",
                    ticket_id,
                    "Ticket #001 deleted",
                    tenant.id,
                )
                .for_ticket(ticket_id),
            )
            .await
            .unwrap();

        let admin = Caller {
            user_id: Uuid::new_v4(),
            role: Role::FranchisorAdmin,
            tenant_id: tenant.id,
        };
        let entries = service.list_for_ticket(ticket_id, admin).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "TICKET_DELETED");
    }

    #[tokio::test]
    async fn user_activity_is_filtered_to_visible_tenants() {
        let store = Arc::new(MemoryStore::new());
        let visible = seed_tenant(&store, "lacoste-matriz").await;
        let hidden = seed_tenant(&store, "mcdonalds-matriz").await;
        let service = LogService::new(store.clone(), AccessResolver::new(store.clone()));

        let actor = Uuid::new_v4();
        for tenant_id in [visible.id, hidden.id] {
            service
                .record(
                    NewLogEntry::new(
                        "TICKET_CREATED",
                        "TICKET",
                        Uuid::new_v4(),
                        "Ticket created",
                        tenant_id,
                    )
                    .by_user(actor),
                )
                .await
                .unwrap();
        }

        let lacoste_admin = Caller {
            user_id: Uuid::new_v4(),
            role: Role::FranchisorAdmin,
            tenant_id: visible.id,
        };
        let entries = service.list_for_user(actor, lacoste_admin).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tenant_id, visible.id);
    }
}
