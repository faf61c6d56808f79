use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::tenant::TenantType;

/// Closed role enumeration. Tokens carrying any other string never parse
/// into a `Role`, so unknown roles are rejected at the credential boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    CrownAdmin,
    FranchisorAdmin,
    FranchiseAdmin,
    Agent,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CrownAdmin => "CROWN_ADMIN",
            Role::FranchisorAdmin => "FRANCHISOR_ADMIN",
            Role::FranchiseAdmin => "FRANCHISE_ADMIN",
            Role::Agent => "AGENT",
            Role::User => "USER",
        }
    }

    /// Role/tenant-type compatibility: a role may only exist inside a
    /// tenant of its matching kind.
    pub fn allowed_in(&self, tenant_type: TenantType) -> bool {
        match self {
            Role::CrownAdmin => tenant_type == TenantType::Crown,
            Role::FranchisorAdmin => tenant_type == TenantType::Franchisor,
            Role::FranchiseAdmin => tenant_type == TenantType::Franchise,
            Role::Agent | Role::User => {
                matches!(tenant_type, TenantType::Franchisor | TenantType::Franchise)
            }
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Role::CrownAdmin | Role::FranchisorAdmin | Role::FranchiseAdmin
        )
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CROWN_ADMIN" => Ok(Role::CrownAdmin),
            "FRANCHISOR_ADMIN" => Ok(Role::FranchisorAdmin),
            "FRANCHISE_ADMIN" => Ok(Role::FranchiseAdmin),
            "AGENT" => Ok(Role::Agent),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique within the owning tenant.
    pub email: String,
    /// Opaque credential hash; never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
