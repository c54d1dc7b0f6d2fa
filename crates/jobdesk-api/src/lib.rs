//! Axum HTTP API server.
//!
//! This crate provides:
//! - REST endpoints for users, companies, jobs and applications
//! - Bearer-token authentication with bcrypt credential storage
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use auth::AuthUser;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::OwnershipService;
pub use state::AppState;
