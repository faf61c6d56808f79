//! Visibility resolution: which tenants a caller may read or act upon.
//!
//! Every tenant-scoped read/write path goes through this resolver before
//! touching ticket, category or log data; the storage layer assumes no
//! row-level security of its own.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Role, Tenant, Ticket};
use crate::error::{ApiError, ApiResult};
use crate::services::Caller;
use crate::store::Store;

#[derive(Clone)]
pub struct AccessResolver {
    store: Arc<dyn Store>,
}

impl AccessResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Expand the caller's reachable tenant set.
    ///
    /// CROWN_ADMIN sees every active tenant; FRANCHISOR_ADMIN sees its own
    /// tenant plus direct franchise children (one level, never deeper);
    /// everyone else sees exactly their own tenant. The role enumeration
    /// is closed, so there is no fall-through arm.
    pub async fn accessible_tenants(&self, caller: &Caller) -> ApiResult<Vec<Tenant>> {
        match caller.role {
            Role::CrownAdmin => {
                let all = self.store.tenants_all().await?;
                Ok(all.into_iter().filter(|t| t.is_active).collect())
            }
            Role::FranchisorAdmin => {
                let own = self
                    .store
                    .tenant_by_id(caller.tenant_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
                let children = self.store.tenants_by_parent(caller.tenant_id).await?;
                let mut set = vec![own];
                set.extend(children.into_iter().filter(|t| t.is_active));
                Ok(set)
            }
            Role::FranchiseAdmin | Role::Agent | Role::User => {
                let own = self
                    .store
                    .tenant_by_id(caller.tenant_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
                Ok(vec![own])
            }
        }
    }

    pub async fn accessible_tenant_ids(&self, caller: &Caller) -> ApiResult<Vec<Uuid>> {
        Ok(self
            .accessible_tenants(caller)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect())
    }

    pub async fn can_access_tenant(&self, caller: &Caller, target: Uuid) -> ApiResult<bool> {
        Ok(self
            .accessible_tenants(caller)
            .await?
            .iter()
            .any(|t| t.id == target))
    }

    /// Guard used before every tenant-scoped list/read. Failing this is
    /// always `Forbidden`, never `NotFound`: the resource may exist but
    /// sit outside the caller's boundary, and the error type must not
    /// leak that difference.
    pub async fn ensure_can_access_tenant(&self, caller: &Caller, target: Uuid) -> ApiResult<()> {
        if self.can_access_tenant(caller, target).await? {
            Ok(())
        } else {
            tracing::warn!(
                user = %caller.user_id,
                role = %caller.role,
                tenant = %target,
                "tenant access denied"
            );
            Err(ApiError::forbidden(
                "You do not have permission to access this tenant",
            ))
        }
    }

    /// Only the three admin roles may delete tickets.
    pub fn ensure_can_delete_ticket(&self, caller: &Caller) -> ApiResult<()> {
        if caller.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "You do not have permission to delete this ticket",
            ))
        }
    }

    /// A USER may only update tickets they created themselves.
    pub fn ensure_can_update_ticket(&self, caller: &Caller, ticket: &Ticket) -> ApiResult<()> {
        if caller.role == Role::User && ticket.creator_id != Some(caller.user_id) {
            return Err(ApiError::forbidden(
                "You can only update tickets you created",
            ));
        }
        Ok(())
    }

    /// Cross-brand aggregate views are for crown and franchisor admins.
    pub fn ensure_can_view_cross_brand(&self, caller: &Caller) -> ApiResult<()> {
        match caller.role {
            Role::CrownAdmin | Role::FranchisorAdmin => Ok(()),
            Role::FranchiseAdmin | Role::Agent | Role::User => Err(ApiError::forbidden(
                "You do not have permission to view cross-brand aggregates",
            )),
        }
    }
}
