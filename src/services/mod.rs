use uuid::Uuid;

use crate::auth::Claims;
use crate::domain::Role;

pub mod access;
pub mod auth_service;
pub mod category_service;
pub mod log_service;
pub mod tenant_service;
pub mod ticket_service;

pub use access::AccessResolver;
pub use auth_service::{AuthService, LoginRequest, LoginResponse, RegisterUser};
pub use category_service::{CategoryService, CreateCategory, UpdateCategory};
pub use log_service::LogService;
pub use tenant_service::{CreateTenant, TenantDirectory, UpdateTenant};
pub use ticket_service::{
    CreateGuestTicket, CreateTicket, NewComment, TicketService, TicketStats, UpdateTicket,
};

/// Authenticated caller identity threaded through every tenant-scoped
/// operation: who is asking, as what role, from which tenant.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    pub tenant_id: Uuid,
}

impl From<&Claims> for Caller {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
            tenant_id: claims.tenant_id,
        }
    }
}
