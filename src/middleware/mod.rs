pub mod auth;
pub mod response;
pub mod tenant;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::ApiResponse;
pub use tenant::{tenant_context_middleware, TenantContext};
