//! Multi-tenant helpdesk backend: a tenant hierarchy (crown, franchisor,
//! franchise), role-based visibility resolution, per-tenant sequential
//! ticket numbering, and an append-only audit trail, served over HTTP.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod services;
pub mod state;
pub mod store;

pub use router::app;
pub use state::AppState;
