//! Per-tenant ticket categories.
//!
//! Deleting a category that tickets still reference deactivates it
//! instead, so ticket history keeps resolving.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{NewLogEntry, TicketCategory};
use crate::error::{ApiError, ApiResult};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sla_hours: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub sla_hours: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn Store>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, tenant_id: Uuid, dto: CreateCategory) -> ApiResult<TicketCategory> {
        if self
            .store
            .category_by_name_in_tenant(tenant_id, &dto.name)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "A category with this name already exists",
            ));
        }

        let now = Utc::now();
        let category = TicketCategory {
            id: Uuid::new_v4(),
            name: dto.name,
            description: dto.description,
            color: dto.color,
            icon: dto.icon,
            sla_hours: dto.sla_hours,
            is_active: true,
            tenant_id,
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert_category(category).await?)
    }

    pub async fn list(&self, tenant_id: Uuid) -> ApiResult<Vec<TicketCategory>> {
        Ok(self.store.categories_by_tenant(tenant_id, false).await?)
    }

    pub async fn list_active(&self, tenant_id: Uuid) -> ApiResult<Vec<TicketCategory>> {
        Ok(self.store.categories_by_tenant(tenant_id, true).await?)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> ApiResult<TicketCategory> {
        let category = self
            .store
            .category_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        if category.tenant_id != tenant_id {
            // Uniform policy: existing but out-of-tenant is forbidden
            return Err(ApiError::forbidden(
                "You do not have permission to access this category",
            ));
        }
        Ok(category)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        dto: UpdateCategory,
    ) -> ApiResult<TicketCategory> {
        let mut category = self.get(tenant_id, id).await?;

        if let Some(name) = &dto.name {
            if *name != category.name {
                if let Some(existing) = self
                    .store
                    .category_by_name_in_tenant(tenant_id, name)
                    .await?
                {
                    if existing.id != id {
                        return Err(ApiError::conflict(
                            "Another category with this name already exists",
                        ));
                    }
                }
            }
        }

        if let Some(name) = dto.name {
            category.name = name;
        }
        if let Some(description) = dto.description {
            category.description = Some(description);
        }
        if let Some(color) = dto.color {
            category.color = Some(color);
        }
        if let Some(icon) = dto.icon {
            category.icon = Some(icon);
        }
        if let Some(sla_hours) = dto.sla_hours {
            category.sla_hours = Some(sla_hours);
        }
        if let Some(is_active) = dto.is_active {
            category.is_active = is_active;
        }
        category.updated_at = Utc::now();

        Ok(self.store.update_category(category).await?)
    }

    /// Remove a category. When tickets still reference it, the category is
    /// deactivated instead of deleted and remains retrievable.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> ApiResult<Option<TicketCategory>> {
        let mut category = self.get(tenant_id, id).await?;

        let referencing = self.store.count_tickets_in_category(id).await?;
        if referencing > 0 {
            category.is_active = false;
            category.updated_at = Utc::now();
            let category = self.store.update_category(category).await?;
            self.store
                .insert_log(NewLogEntry::new(
                    "CATEGORY_DEACTIVATED",
                    "TICKET_CATEGORY",
                    id,
                    format!(
                        "Category '{}' deactivated ({} tickets reference it)",
                        category.name, referencing
                    ),
                    tenant_id,
                ))
                .await?;
            return Ok(Some(category));
        }

        self.store.delete_category(id).await?;
        Ok(None)
    }
}
