//! User account endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use jobdesk_firestore::{cascade, ResetOutcome, UniqueScope, UserPatch};
use jobdesk_models::{User, UserId, UserProfile, UserRole, UserStatus};

use crate::auth::{generate_reset_code, hash_password, issue_token, verify_password, AuthUser};
use crate::error::{conflict_if_exists, ApiError, ApiResult};
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::validation::{ValidJson, ValidQuery};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
    #[validate(email(message = "must be a valid email address"))]
    pub recovery_email: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub mobile_number: String,
    pub role: UserRole,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

/// POST /users/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = User::new(
        payload.first_name,
        payload.last_name,
        payload.username,
        payload.email,
        hash_password(&payload.password)?,
        payload.recovery_email,
        payload.date_of_birth,
        payload.mobile_number,
        payload.role,
    );

    state
        .unique_keys
        .reserve(UniqueScope::UserEmail, &user.email, user.id.as_str())
        .await
        .map_err(|e| conflict_if_exists(e, "email is already registered"))?;

    if let Err(e) = state
        .unique_keys
        .reserve(UniqueScope::UserMobile, &user.mobile_number, user.id.as_str())
        .await
    {
        state
            .unique_keys
            .try_release(UniqueScope::UserEmail, &user.email)
            .await;
        return Err(conflict_if_exists(e, "mobile number is already registered"));
    }

    if let Err(e) = state.users.create(&user).await {
        state
            .unique_keys
            .try_release(UniqueScope::UserEmail, &user.email)
            .await;
        state
            .unique_keys
            .try_release(UniqueScope::UserMobile, &user.mobile_number)
            .await;
        return Err(e.into());
    }

    info!(user_id = %user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub email_or_mobile_number: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct SigninResponse {
    pub message: String,
    pub token: String,
}

/// POST /users/signin
///
/// The identifier matches against email first, then mobile number. Status
/// flips to online before the token is returned, so a signed-in account is
/// never observed offline.
pub async fn signin(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SigninRequest>,
) -> ApiResult<Json<SigninResponse>> {
    let identifier = payload.email_or_mobile_number.trim();

    let user = match state.users.find_by_email(identifier).await? {
        Some(u) => Some(u),
        None => state.users.find_by_mobile(identifier).await?,
    }
    .ok_or_else(|| ApiError::not_found("no account for that email or mobile number"))?;

    if !verify_password(&payload.password, &user.password) {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    state.users.set_status(&user.id, UserStatus::Online).await?;
    let token = issue_token(&user.id, &state.config.jwt_secret)?;

    info!(user_id = %user.id, "User signed in");
    Ok(Json(SigninResponse {
        message: "Signed in successfully".to_string(),
        token,
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub username: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub recovery_email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub mobile_number: Option<String>,
}

/// PUT /users/update
pub async fn update_account(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<UpdateAccountRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .get(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;

    let patch = UserPatch {
        first_name: payload.first_name,
        last_name: payload.last_name,
        username: payload.username,
        email: payload.email,
        recovery_email: payload.recovery_email,
        date_of_birth: payload.date_of_birth,
        mobile_number: payload.mobile_number,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("at least one field must be provided"));
    }

    // Unique fields: reserve the new value before the write, release the old
    // one after it. A value equal to the current one needs no reservation.
    let new_email = patch.email.as_ref().filter(|e| **e != user.email);
    let new_mobile = patch
        .mobile_number
        .as_ref()
        .filter(|m| **m != user.mobile_number);

    if let Some(email) = new_email {
        state
            .unique_keys
            .reserve(UniqueScope::UserEmail, email, user.id.as_str())
            .await
            .map_err(|e| conflict_if_exists(e, "email is already registered"))?;
    }
    if let Some(mobile) = new_mobile {
        if let Err(e) = state
            .unique_keys
            .reserve(UniqueScope::UserMobile, mobile, user.id.as_str())
            .await
        {
            if let Some(email) = new_email {
                state
                    .unique_keys
                    .try_release(UniqueScope::UserEmail, email)
                    .await;
            }
            return Err(conflict_if_exists(e, "mobile number is already registered"));
        }
    }

    let updated = match state.users.update(&user.id, &patch).await {
        Ok(u) => u,
        Err(e) => {
            if let Some(email) = new_email {
                state
                    .unique_keys
                    .try_release(UniqueScope::UserEmail, email)
                    .await;
            }
            if let Some(mobile) = new_mobile {
                state
                    .unique_keys
                    .try_release(UniqueScope::UserMobile, mobile)
                    .await;
            }
            return Err(e.into());
        }
    };

    if new_email.is_some() {
        state
            .unique_keys
            .try_release(UniqueScope::UserEmail, &user.email)
            .await;
    }
    if new_mobile.is_some() {
        state
            .unique_keys
            .try_release(UniqueScope::UserMobile, &user.mobile_number)
            .await;
    }

    info!(user_id = %user.id, "User account updated");
    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user: updated,
    }))
}

/// DELETE /users/delete
///
/// Removes the whole account graph: the owned company (if any) with its jobs
/// and their applications, the caller's own applications, every unique-key
/// reservation, and finally the user record itself.
pub async fn delete_account(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    let user = state
        .users
        .get(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;

    let company = state.ownership.company_of(&caller.id).await?;
    cascade::delete_user_graph(&state.firestore, &user, company.as_ref()).await?;

    info!(user_id = %user.id, "User account deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// GET /users/account
pub async fn get_account(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .get(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;

    Ok(Json(user))
}

/// GET /users/profile/:userId
pub async fn get_profile(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let user = state
        .users
        .get(&UserId::from_string(user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(UserProfile::from(&user)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub old_password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub new_password: String,
}

/// PUT /users/update-password
pub async fn update_password(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<UpdatePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state
        .users
        .get(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;

    if !verify_password(&payload.old_password, &user.password) {
        return Err(ApiError::unauthorized("old password does not match"));
    }

    let digest = hash_password(&payload.new_password)?;
    state.users.set_password(&user.id, &digest).await?;

    info!(user_id = %user.id, "Password updated");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgetPasswordRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub otp: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub new_password: Option<String>,
}

/// POST /users/forget-password
///
/// One route, two modes selected by body shape: `{email}` issues a reset
/// code; `{email, otp, newPassword}` consumes it. Providing exactly one of
/// otp / newPassword is rejected.
pub async fn forget_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ForgetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    match (payload.otp, payload.new_password) {
        (None, None) => {
            let user = state
                .users
                .find_by_email(&payload.email)
                .await?
                .ok_or_else(|| ApiError::not_found("email is not registered"))?;

            let code = generate_reset_code();
            state.users.set_reset_code(&user.id, &code).await?;

            info!(user_id = %user.id, "Password reset code issued");
            // Stands in for out-of-band delivery (email/SMS).
            debug!(user_id = %user.id, code = %code, "Reset code generated");

            Ok(Json(MessageResponse::new("OTP sent successfully")))
        }
        (Some(otp), Some(new_password)) => {
            let digest = hash_password(&new_password)?;
            match state
                .users
                .complete_password_reset(&payload.email, &otp, &digest)
                .await?
            {
                ResetOutcome::Completed => {
                    info!(email = %payload.email, "Password reset completed");
                    Ok(Json(MessageResponse::new("Password reset successful")))
                }
                ResetOutcome::UserMissing => Err(ApiError::not_found("email is not registered")),
                ResetOutcome::OtpMismatch => {
                    Err(ApiError::unauthorized("reset code does not match"))
                }
            }
        }
        _ => Err(ApiError::validation(
            "otp and newPassword must be provided together",
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryEmailQuery {
    pub recovery_email: String,
}

/// GET /users/accounts-by-recovery-email
///
/// Only callers whose own account carries the queried recovery email may
/// list the accounts sharing it.
pub async fn accounts_by_recovery_email(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidQuery(query): ValidQuery<RecoveryEmailQuery>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let user = state
        .users
        .get(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;

    if user.recovery_email != query.recovery_email {
        return Err(ApiError::forbidden(
            "recovery email does not match your account",
        ));
    }

    let users = state
        .users
        .list_by_recovery_email(&query.recovery_email)
        .await?;

    Ok(Json(users.iter().map(UserProfile::from).collect()))
}
