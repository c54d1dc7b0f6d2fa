//! API route definitions.

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers;
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Build the application router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Credential endpoints get a tighter per-IP budget than the rest of the
    // API; they are the ones worth brute-forcing.
    let auth_limiter = Arc::new(RateLimiterCache::new(
        state.config.auth_rate_limit_rps,
        state.config.auth_rate_limit_rps,
    ));
    let api_limiter = Arc::new(RateLimiterCache::new(
        state.config.rate_limit_rps,
        state.config.rate_limit_burst,
    ));

    let credential_routes = Router::new()
        .route("/users/signup", post(handlers::signup))
        .route("/users/signin", post(handlers::signin))
        .route("/users/forget-password", post(handlers::forget_password))
        .layer(from_fn_with_state(auth_limiter, rate_limit_middleware));

    let user_routes = Router::new()
        .route("/users/update", put(handlers::update_account))
        .route("/users/delete", delete(handlers::delete_account))
        .route("/users/account", get(handlers::get_account))
        .route("/users/profile/:user_id", get(handlers::get_profile))
        .route("/users/update-password", put(handlers::update_password))
        .route(
            "/users/accounts-by-recovery-email",
            get(handlers::accounts_by_recovery_email),
        );

    let company_routes = Router::new()
        .route("/companies/add", post(handlers::add_company))
        .route(
            "/companies/update/:company_id",
            put(handlers::update_company),
        )
        .route(
            "/companies/delete/:company_id",
            delete(handlers::delete_company),
        )
        .route(
            "/companies/details/:company_id",
            get(handlers::company_details),
        )
        .route("/companies/search", get(handlers::search_companies))
        .route(
            "/companies/applications/:job_id",
            get(handlers::applications_for_job),
        );

    let job_routes = Router::new()
        .route("/jobs/add", post(handlers::add_job))
        .route("/jobs/update/:job_id", put(handlers::update_job))
        .route("/jobs/delete/:job_id", delete(handlers::delete_job))
        .route("/jobs/all", get(handlers::list_all_jobs))
        .route("/jobs/by-company", get(handlers::list_jobs_by_company))
        .route("/jobs/filter", get(handlers::filter_jobs))
        .route("/jobs/apply", post(handlers::apply_to_job));

    let api_routes = Router::new()
        .merge(credential_routes)
        .merge(user_routes)
        .merge(company_routes)
        .merge(job_routes)
        .layer(from_fn_with_state(api_limiter, rate_limit_middleware));

    // /metrics only exists when a recorder was installed at startup.
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .route("/health", get(handlers::health))
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers))
        .layer(from_fn(request_id))
        .layer(from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
