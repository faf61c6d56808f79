use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a tenant in the two-level hierarchy.
///
/// CROWN is the single super-tenant, FRANCHISOR tenants own a brand and
/// FRANCHISE tenants are individual locations parented to a franchisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantType {
    Crown,
    Franchisor,
    Franchise,
}

impl TenantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantType::Crown => "CROWN",
            TenantType::Franchisor => "FRANCHISOR",
            TenantType::Franchise => "FRANCHISE",
        }
    }
}

impl std::str::FromStr for TenantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CROWN" => Ok(TenantType::Crown),
            "FRANCHISOR" => Ok(TenantType::Franchisor),
            "FRANCHISE" => Ok(TenantType::Franchise),
            other => Err(format!("unknown tenant type: {}", other)),
        }
    }
}

impl std::fmt::Display for TenantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    /// Unique external key (tax id); format validation is out of scope.
    pub tax_id: String,
    /// URL-safe slug used for tenant routing.
    pub slug: String,
    pub domain: Option<String>,
    pub tenant_type: TenantType,
    pub brand: Option<String>,
    pub segment: Option<String>,
    pub is_active: bool,
    pub parent_tenant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
