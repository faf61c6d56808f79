//! Tenant directory: authoritative store and integrity gatekeeper for
//! the tenant hierarchy.
//!
//! The directory enforces uniqueness (slug, tax id, domain) and the
//! hierarchy invariants; it never authorizes the caller itself, that is
//! the access resolver's job.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{NewLogEntry, Tenant, TenantType};
use crate::error::{ApiError, ApiResult};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub tax_id: String,
    pub slug: String,
    pub domain: Option<String>,
    #[serde(rename = "type")]
    pub tenant_type: TenantType,
    pub brand: Option<String>,
    pub segment: Option<String>,
    pub parent_tenant_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub slug: Option<String>,
    pub domain: Option<String>,
    pub brand: Option<String>,
    pub segment: Option<String>,
}

#[derive(Clone)]
pub struct TenantDirectory {
    store: Arc<dyn Store>,
}

impl TenantDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, dto: CreateTenant) -> ApiResult<Tenant> {
        if self.store.tenant_by_tax_id(&dto.tax_id).await?.is_some() {
            return Err(ApiError::conflict("Tax id already in use"));
        }
        if self.store.tenant_by_slug(&dto.slug).await?.is_some() {
            return Err(ApiError::conflict("Slug already in use"));
        }
        if let Some(domain) = &dto.domain {
            if self.store.tenant_by_domain(domain).await?.is_some() {
                return Err(ApiError::conflict("Domain already in use"));
            }
        }

        match dto.tenant_type {
            TenantType::Franchise => {
                let parent_id = dto.parent_tenant_id.ok_or_else(|| {
                    ApiError::validation("A franchise requires a parent franchisor")
                })?;
                let parent = self
                    .store
                    .tenant_by_id(parent_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Parent tenant not found"))?;
                if parent.tenant_type != TenantType::Franchisor {
                    return Err(ApiError::validation("Parent tenant must be a franchisor"));
                }
                if dto.brand != parent.brand {
                    return Err(ApiError::validation(
                        "A franchise must carry the same brand as its franchisor",
                    ));
                }
            }
            TenantType::Crown | TenantType::Franchisor => {
                if dto.parent_tenant_id.is_some() {
                    return Err(ApiError::validation(
                        "Only franchise tenants may have a parent",
                    ));
                }
            }
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: dto.name,
            tax_id: dto.tax_id,
            slug: dto.slug,
            domain: dto.domain,
            tenant_type: dto.tenant_type,
            brand: dto.brand,
            segment: dto.segment,
            is_active: true,
            parent_tenant_id: dto.parent_tenant_id,
            created_at: now,
            updated_at: now,
        };
        let tenant = self.store.insert_tenant(tenant).await?;

        self.store
            .insert_log(NewLogEntry::new(
                "TENANT_CREATED",
                "TENANT",
                tenant.id,
                format!("Tenant '{}' created", tenant.name),
                tenant.id,
            ))
            .await?;

        tracing::info!(tenant = %tenant.slug, kind = %tenant.tenant_type, "tenant registered");
        Ok(tenant)
    }

    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Tenant> {
        self.store
            .tenant_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant not found"))
    }

    pub async fn find_by_slug(&self, slug: &str) -> ApiResult<Tenant> {
        self.store
            .tenant_by_slug(slug)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant not found"))
    }

    pub async fn find_by_tax_id(&self, tax_id: &str) -> ApiResult<Tenant> {
        self.store
            .tenant_by_tax_id(tax_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant not found"))
    }

    pub async fn find_by_domain(&self, domain: &str) -> ApiResult<Tenant> {
        self.store
            .tenant_by_domain(domain)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant not found"))
    }

    /// Resolve a path segment that may be either a tenant id or a slug.
    pub async fn resolve(&self, slug_or_id: &str) -> ApiResult<Tenant> {
        match slug_or_id.parse::<Uuid>() {
            Ok(id) => self.find_by_id(id).await,
            Err(_) => self.find_by_slug(slug_or_id).await,
        }
    }

    pub async fn list_all(&self) -> ApiResult<Vec<Tenant>> {
        Ok(self.store.tenants_all().await?)
    }

    /// Direct franchise children of a franchisor.
    pub async fn children_of(&self, franchisor_id: Uuid) -> ApiResult<Vec<Tenant>> {
        let franchisor = self.find_by_id(franchisor_id).await?;
        if franchisor.tenant_type != TenantType::Franchisor {
            return Err(ApiError::validation("Tenant must be a franchisor"));
        }
        Ok(self.store.tenants_by_parent(franchisor_id).await?)
    }

    pub async fn find_by_brand(&self, brand: &str) -> ApiResult<Vec<Tenant>> {
        Ok(self.store.tenants_by_brand(brand).await?)
    }

    pub async fn find_by_segment(&self, segment: &str) -> ApiResult<Vec<Tenant>> {
        Ok(self.store.tenants_by_segment(segment).await?)
    }

    /// Distinct (brand, segment) pairs across the directory.
    pub async fn list_brands(&self) -> ApiResult<Vec<(String, Option<String>)>> {
        let mut brands: Vec<(String, Option<String>)> = Vec::new();
        for tenant in self.store.tenants_all().await? {
            if let Some(brand) = tenant.brand {
                if !brands.iter().any(|(b, _)| *b == brand) {
                    brands.push((brand, tenant.segment));
                }
            }
        }
        brands.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(brands)
    }

    pub async fn list_segments(&self) -> ApiResult<Vec<String>> {
        let mut segments: Vec<String> = Vec::new();
        for tenant in self.store.tenants_all().await? {
            if let Some(segment) = tenant.segment {
                if !segments.contains(&segment) {
                    segments.push(segment);
                }
            }
        }
        segments.sort();
        Ok(segments)
    }

    pub async fn update(&self, id: Uuid, dto: UpdateTenant) -> ApiResult<Tenant> {
        let mut tenant = self.find_by_id(id).await?;

        if let Some(tax_id) = &dto.tax_id {
            if *tax_id != tenant.tax_id && self.store.tenant_by_tax_id(tax_id).await?.is_some() {
                return Err(ApiError::conflict("Tax id already in use"));
            }
        }
        if let Some(slug) = &dto.slug {
            if *slug != tenant.slug && self.store.tenant_by_slug(slug).await?.is_some() {
                return Err(ApiError::conflict("Slug already in use"));
            }
        }
        if let Some(domain) = &dto.domain {
            if tenant.domain.as_deref() != Some(domain)
                && self.store.tenant_by_domain(domain).await?.is_some()
            {
                return Err(ApiError::conflict("Domain already in use"));
            }
        }

        if let Some(name) = dto.name {
            tenant.name = name;
        }
        if let Some(tax_id) = dto.tax_id {
            tenant.tax_id = tax_id;
        }
        if let Some(slug) = dto.slug {
            tenant.slug = slug;
        }
        if let Some(domain) = dto.domain {
            tenant.domain = Some(domain);
        }
        if let Some(brand) = dto.brand {
            tenant.brand = Some(brand);
        }
        if let Some(segment) = dto.segment {
            tenant.segment = Some(segment);
        }
        tenant.updated_at = Utc::now();

        Ok(self.store.update_tenant(tenant).await?)
    }

    /// Soft deactivation toggle.
    pub async fn toggle_active(&self, id: Uuid) -> ApiResult<Tenant> {
        let mut tenant = self.find_by_id(id).await?;
        tenant.is_active = !tenant.is_active;
        tenant.updated_at = Utc::now();
        let tenant = self.store.update_tenant(tenant).await?;
        tracing::info!(tenant = %tenant.slug, active = tenant.is_active, "tenant active flag toggled");
        Ok(tenant)
    }

    /// Hard delete; only childless tenants may go.
    pub async fn remove(&self, id: Uuid) -> ApiResult<()> {
        let tenant = self.find_by_id(id).await?;
        let children = self.store.tenants_by_parent(id).await?;
        if !children.is_empty() {
            return Err(ApiError::precondition(
                "Cannot delete a franchisor that still has franchises",
            ));
        }

        self.store.delete_tenant(id).await?;
        self.store
            .insert_log(NewLogEntry::new(
                "TENANT_DELETED",
                "TENANT",
                tenant.id,
                format!("Tenant '{}' deleted", tenant.name),
                tenant.id,
            ))
            .await?;
        Ok(())
    }
}
