//! User account models.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum UserRole {
    #[default]
    User,
    #[serde(rename = "Company_HR")]
    CompanyHr,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "User",
            UserRole::CompanyHr => "Company_HR",
        }
    }

    /// Parse from the wire spelling. Returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "User" => Some(UserRole::User),
            "Company_HR" => Some(UserRole::CompanyHr),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presence status, flipped to online at successful signin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
        }
    }

    /// Parse from the wire spelling. Returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(UserStatus::Online),
            "offline" => Some(UserStatus::Offline),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User account stored in Firestore.
///
/// The password digest and the pending one-time passcode never serialize
/// into responses.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: UserId,

    pub first_name: String,

    pub last_name: String,

    pub username: String,

    /// Globally unique
    pub email: String,

    /// bcrypt digest, never the plain password
    #[serde(skip_serializing, default)]
    pub password: String,

    pub recovery_email: String,

    /// ISO 8601 calendar date
    pub date_of_birth: NaiveDate,

    /// Globally unique
    pub mobile_number: String,

    #[serde(default)]
    pub role: UserRole,

    #[serde(default)]
    pub status: UserStatus,

    /// Pending password-reset passcode, cleared on use
    #[serde(skip_serializing, default)]
    pub otp: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new account record with a fresh ID and offline status.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_digest: impl Into<String>,
        recovery_email: impl Into<String>,
        date_of_birth: NaiveDate,
        mobile_number: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: email.into(),
            password: password_digest.into(),
            recovery_email: recovery_email.into(),
            date_of_birth,
            mobile_number: mobile_number.into(),
            role,
            status: UserStatus::Offline,
            otp: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flip presence to online.
    pub fn mark_online(mut self) -> Self {
        self.status = UserStatus::Online;
        self.updated_at = Utc::now();
        self
    }

    /// Flip presence to offline.
    pub fn mark_offline(mut self) -> Self {
        self.status = UserStatus::Offline;
        self.updated_at = Utc::now();
        self
    }
}

/// Reduced projection returned for profile lookups of other users.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: String,
    pub role: UserRole,
    pub status: UserStatus,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            mobile_number: user.mobile_number.clone(),
            role: user.role,
            status: user.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "Amira",
            "Hassan",
            "amirah",
            "amira@example.com",
            "$2b$10$abcdefghijklmnopqrstuv",
            "recovery@example.com",
            NaiveDate::from_ymd_opt(1994, 6, 12).unwrap(),
            "+201001234567",
            UserRole::CompanyHr,
        )
    }

    #[test]
    fn test_user_id_generation() {
        let id1 = UserId::new();
        let id2 = UserId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_user_starts_offline() {
        let user = sample_user();
        assert_eq!(user.status, UserStatus::Offline);
        assert!(user.otp.is_none());
    }

    #[test]
    fn test_mark_online() {
        let user = sample_user().mark_online();
        assert_eq!(user.status, UserStatus::Online);
    }

    #[test]
    fn test_role_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&UserRole::CompanyHr).unwrap(),
            "\"Company_HR\""
        );
        assert_eq!(UserRole::parse("Company_HR"), Some(UserRole::CompanyHr));
        assert_eq!(UserRole::parse("company_hr"), None);
    }

    #[test]
    fn test_password_and_otp_never_serialize() {
        let mut user = sample_user();
        user.otp = Some("123456".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("otp").is_none());
        assert_eq!(json["email"], "amira@example.com");
        assert_eq!(json["mobileNumber"], "+201001234567");
    }

    #[test]
    fn test_profile_projection() {
        let user = sample_user();
        let profile = UserProfile::from(&user);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["firstName"], "Amira");
        assert_eq!(json["role"], "Company_HR");
        assert!(json.get("recoveryEmail").is_none());
    }
}
