//! Request payload validation.
//!
//! `ValidJson` replaces `axum::Json` in handler signatures: it deserializes
//! the body, runs the derive-based rules, and turns the first violation into
//! a `VALIDATION_ERROR` response. Field names in violation details use the
//! wire (camelCase) spelling, not the Rust one.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// JSON body extractor with schema validation.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| ApiError::validation(first_violation(&e)))?;

        Ok(ValidJson(value))
    }
}

/// Query string extractor whose deserialization failures surface as
/// validation errors instead of bare 400s.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;

        Ok(ValidQuery(value))
    }
}

/// Render the first violation as "field: reason", with fields sorted so the
/// reported violation is stable across runs.
fn first_violation(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    if let Some((field, violations)) = fields.first() {
        if let Some(violation) = violations.first() {
            let reason = violation
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("failed the {} check", violation.code));
            return format!("{}: {}", wire_name(field), reason);
        }
    }

    "invalid request body".to_string()
}

fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
