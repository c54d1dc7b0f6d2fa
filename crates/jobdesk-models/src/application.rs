//! Job application models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::job::JobId;
use crate::user::{User, UserId};

/// Unique identifier for an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    /// Generate a new random application ID.
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

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Application record stored in Firestore.
///
/// Written once when a user applies; never updated; removed only when the
/// parent job (or the submitting user) is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Unique application ID
    pub id: ApplicationId,

    pub job_id: JobId,

    pub user_id: UserId,

    pub user_tech_skills: Vec<String>,

    pub user_soft_skills: Vec<String>,

    /// Resume URL
    pub user_resume: String,

    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Create a new application tying `user_id` to `job_id`.
    pub fn new(
        job_id: JobId,
        user_id: UserId,
        user_tech_skills: Vec<String>,
        user_soft_skills: Vec<String>,
        user_resume: impl Into<String>,
    ) -> Self {
        Self {
            id: ApplicationId::new(),
            job_id,
            user_id,
            user_tech_skills,
            user_soft_skills,
            user_resume: user_resume.into(),
            created_at: Utc::now(),
        }
    }
}

/// Applicant identity joined onto an application for HR review.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for ApplicantInfo {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Application with the applicant's name and email projected in.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithApplicant {
    #[serde(flatten)]
    pub application: Application,

    /// Absent when the applicant account no longer resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantInfo>,
}
