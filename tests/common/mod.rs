#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use helpdesk_api::auth::{BcryptHasher, JwtSigner};
use helpdesk_api::domain::{Role, Tenant, TenantType, TicketCategory, User};
use helpdesk_api::services::{Caller, CreateTenant, RegisterUser};
use helpdesk_api::state::AppState;
use helpdesk_api::store::{CategoryStore, MemoryStore};

/// A seeded two-brand world over the in-memory store:
///
/// - crown
/// - lacoste-matriz (franchisor, brand Lacoste)
///   - lacoste-loja-centro (franchise)
///   - lacoste-loja-shopping (franchise)
/// - mcdonalds-matriz (franchisor, brand McDonalds)
///   - mcdonalds-loja-1 (franchise)
pub struct World {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub crown: Tenant,
    pub lacoste_hq: Tenant,
    pub lacoste_centro: Tenant,
    pub lacoste_shopping: Tenant,
    pub mcdonalds_hq: Tenant,
    pub mcdonalds_loja: Tenant,
    pub crown_admin: User,
    pub lacoste_admin: User,
    pub centro_admin: User,
    pub centro_agent: User,
    pub centro_user: User,
    pub mcdonalds_admin: User,
    pub centro_category: TicketCategory,
}

impl World {
    pub fn caller(&self, user: &User) -> Caller {
        Caller {
            user_id: user.id,
            role: user.role,
            tenant_id: user.tenant_id,
        }
    }
}

fn create_tenant_dto(
    name: &str,
    slug: &str,
    tenant_type: TenantType,
    brand: Option<&str>,
    parent: Option<Uuid>,
) -> CreateTenant {
    CreateTenant {
        name: name.to_string(),
        tax_id: format!("tax-{}", slug),
        slug: slug.to_string(),
        domain: None,
        tenant_type,
        brand: brand.map(str::to_string),
        segment: None,
        parent_tenant_id: parent,
    }
}

async fn register(state: &AppState, tenant_id: Uuid, role: Role, email: &str) -> Result<User> {
    Ok(state
        .auth
        .register(RegisterUser {
            name: email.to_string(),
            email: email.to_string(),
            password: "s3cret!".to_string(),
            role,
            tenant_id: Some(tenant_id),
        })
        .await?)
}

pub async fn world() -> Result<World> {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        store.clone(),
        Arc::new(JwtSigner::new("integration-test-secret")),
        // Minimum bcrypt cost keeps the suite fast
        Arc::new(BcryptHasher::new(4)),
    );

    // Crown bootstraps through the first CROWN_ADMIN registration
    let crown_admin = state
        .auth
        .register(RegisterUser {
            name: "root".to_string(),
            email: "root@crown.com".to_string(),
            password: "s3cret!".to_string(),
            role: Role::CrownAdmin,
            tenant_id: None,
        })
        .await?;
    let crown = state
        .store
        .tenant_by_id(crown_admin.tenant_id)
        .await?
        .expect("crown tenant");

    let lacoste_hq = state
        .tenants
        .create(create_tenant_dto(
            "Lacoste Matriz",
            "lacoste-matriz",
            TenantType::Franchisor,
            Some("Lacoste"),
            None,
        ))
        .await?;
    let lacoste_centro = state
        .tenants
        .create(create_tenant_dto(
            "Lacoste Loja Centro",
            "lacoste-loja-centro",
            TenantType::Franchise,
            Some("Lacoste"),
            Some(lacoste_hq.id),
        ))
        .await?;
    let lacoste_shopping = state
        .tenants
        .create(create_tenant_dto(
            "Lacoste Loja Shopping",
            "lacoste-loja-shopping",
            TenantType::Franchise,
            Some("Lacoste"),
            Some(lacoste_hq.id),
        ))
        .await?;
    let mcdonalds_hq = state
        .tenants
        .create(create_tenant_dto(
            "McDonalds Matriz",
            "mcdonalds-matriz",
            TenantType::Franchisor,
            Some("McDonalds"),
            None,
        ))
        .await?;
    let mcdonalds_loja = state
        .tenants
        .create(create_tenant_dto(
            "McDonalds Loja 1",
            "mcdonalds-loja-1",
            TenantType::Franchise,
            Some("McDonalds"),
            Some(mcdonalds_hq.id),
        ))
        .await?;

    let lacoste_admin = register(
        &state,
        lacoste_hq.id,
        Role::FranchisorAdmin,
        "admin@lacoste.com",
    )
    .await?;
    let centro_admin = register(
        &state,
        lacoste_centro.id,
        Role::FranchiseAdmin,
        "admin@centro.lacoste.com",
    )
    .await?;
    let centro_agent = register(
        &state,
        lacoste_centro.id,
        Role::Agent,
        "agent@centro.lacoste.com",
    )
    .await?;
    let centro_user = register(
        &state,
        lacoste_centro.id,
        Role::User,
        "user@centro.lacoste.com",
    )
    .await?;
    let mcdonalds_admin = register(
        &state,
        mcdonalds_hq.id,
        Role::FranchisorAdmin,
        "admin@mcdonalds.com",
    )
    .await?;

    let now = chrono::Utc::now();
    let centro_category = TicketCategory {
        id: Uuid::new_v4(),
        name: "Suporte".to_string(),
        description: None,
        color: None,
        icon: None,
        sla_hours: Some(24),
        is_active: true,
        tenant_id: lacoste_centro.id,
        created_at: now,
        updated_at: now,
    };
    store.insert_category(centro_category.clone()).await?;

    Ok(World {
        state,
        store,
        crown,
        lacoste_hq,
        lacoste_centro,
        lacoste_shopping,
        mcdonalds_hq,
        mcdonalds_loja,
        crown_admin,
        lacoste_admin,
        centro_admin,
        centro_agent,
        centro_user,
        mcdonalds_admin,
        centro_category,
    })
}
