use std::sync::Arc;

use crate::auth::{BcryptHasher, JwtSigner, PasswordHasher, TokenSigner};
use crate::services::{
    AccessResolver, AuthService, CategoryService, LogService, TenantDirectory, TicketService,
};
use crate::store::Store;

/// Shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub signer: Arc<dyn TokenSigner>,
    pub resolver: AccessResolver,
    pub auth: AuthService,
    pub tenants: TenantDirectory,
    pub tickets: TicketService,
    pub categories: CategoryService,
    pub logs: LogService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        signer: Arc<dyn TokenSigner>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let resolver = AccessResolver::new(store.clone());
        Self {
            auth: AuthService::new(store.clone(), signer.clone(), hasher),
            tenants: TenantDirectory::new(store.clone()),
            tickets: TicketService::new(store.clone(), resolver.clone()),
            categories: CategoryService::new(store.clone()),
            logs: LogService::new(store.clone(), resolver.clone()),
            resolver,
            signer,
            store,
        }
    }

    /// State wired with the config-backed JWT signer and bcrypt hasher.
    pub fn with_defaults(store: Arc<dyn Store>) -> Self {
        Self::new(
            store,
            Arc::new(JwtSigner::from_config()),
            Arc::new(BcryptHasher::from_config()),
        )
    }
}
