//! Credential handling and bearer-token authentication.
//!
//! Passwords are stored as bcrypt digests and never leave the store layer.
//! Sessions are stateless HS256 tokens carrying the user id as `sub`; there
//! is no server-side session record to revoke, so the expiry window is the
//! only bound on a stolen token.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use jobdesk_models::UserId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Fixed bcrypt work factor.
pub const BCRYPT_COST: u32 = 10;

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued to.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Token verification failure. Expired tokens are reported distinctly so
/// clients can prompt for re-authentication instead of treating the session
/// as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    Expired,
    Invalid,
}

/// Hash a password for storage.
pub fn hash_password(plain: &str) -> ApiResult<String> {
    bcrypt::hash(plain, BCRYPT_COST)
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored digest. Malformed digests verify as
/// false rather than erroring.
pub fn verify_password(plain: &str, digest: &str) -> bool {
    bcrypt::verify(plain, digest).unwrap_or(false)
}

/// Issue a session token for the given user.
pub fn issue_token(user_id: &UserId, secret: &str) -> ApiResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.as_str().to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Token signing failed: {}", e)))
}

/// Verify a session token and extract the subject.
pub fn verify_token(token: &str, secret: &str) -> Result<UserId, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Invalid,
    })?;

    Ok(UserId::from_string(data.claims.sub))
}

/// Generate a six-digit password reset code.
pub fn generate_reset_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
///
/// Handlers taking this parameter are token-gated; the id is trusted for the
/// request's lifetime even if the account is deleted mid-flight.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::unauthorized("missing authorization token"))?;

        let id = verify_token(bearer.token(), &state.config.jwt_secret).map_err(|e| match e {
            AuthError::Expired => ApiError::unauthorized("token expired"),
            AuthError::Invalid => ApiError::unauthorized("invalid token"),
        })?;

        Ok(AuthUser { id })
    }
}

// ============================================================================
// Tests
// ============================================================================
