//! Job posting models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::user::UserId;

/// Unique identifier for a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
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

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where the work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobLocation {
    Onsite,
    Remotely,
    Hybrid,
}

impl JobLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobLocation::Onsite => "onsite",
            JobLocation::Remotely => "remotely",
            JobLocation::Hybrid => "hybrid",
        }
    }

    /// Parse from the wire spelling. Returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "onsite" => Some(JobLocation::Onsite),
            "remotely" => Some(JobLocation::Remotely),
            "hybrid" => Some(JobLocation::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for JobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekly time commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum WorkingTime {
    PartTime,
    FullTime,
}

impl WorkingTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkingTime::PartTime => "part-time",
            WorkingTime::FullTime => "full-time",
        }
    }

    /// Parse from the wire spelling. Returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "part-time" => Some(WorkingTime::PartTime),
            "full-time" => Some(WorkingTime::FullTime),
            _ => None,
        }
    }
}

impl fmt::Display for WorkingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Seniority ladder for a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SeniorityLevel {
    Junior,
    #[serde(rename = "Mid-Level")]
    MidLevel,
    Senior,
    #[serde(rename = "Team-Lead")]
    TeamLead,
    #[serde(rename = "CTO")]
    Cto,
}

impl SeniorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeniorityLevel::Junior => "Junior",
            SeniorityLevel::MidLevel => "Mid-Level",
            SeniorityLevel::Senior => "Senior",
            SeniorityLevel::TeamLead => "Team-Lead",
            SeniorityLevel::Cto => "CTO",
        }
    }

    /// Parse from the wire spelling. Returns `None` for anything outside the set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Junior" => Some(SeniorityLevel::Junior),
            "Mid-Level" => Some(SeniorityLevel::MidLevel),
            "Senior" => Some(SeniorityLevel::Senior),
            "Team-Lead" => Some(SeniorityLevel::TeamLead),
            "CTO" => Some(SeniorityLevel::Cto),
            _ => None,
        }
    }
}

impl fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job posting stored in Firestore.
///
/// `added_by` is the posting HR user, immutable; ownership checks resolve
/// through that user's company record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    pub job_title: String,

    pub job_location: JobLocation,

    pub working_time: WorkingTime,

    pub seniority_level: SeniorityLevel,

    pub job_description: String,

    /// Ordered, as submitted
    pub technical_skills: Vec<String>,

    /// Ordered, as submitted
    pub soft_skills: Vec<String>,

    /// Posting HR user, immutable
    pub added_by: UserId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new posting owned by `added_by`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_title: impl Into<String>,
        job_location: JobLocation,
        working_time: WorkingTime,
        seniority_level: SeniorityLevel,
        job_description: impl Into<String>,
        technical_skills: Vec<String>,
        soft_skills: Vec<String>,
        added_by: UserId,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: JobId::new(),
            job_title: job_title.into(),
            job_location,
            working_time,
            seniority_level,
            job_description: job_description.into(),
            technical_skills,
            soft_skills,
            added_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match on the title.
    pub fn title_matches(&self, needle: &str) -> bool {
        self.job_title.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Whether the posting lists every one of `skills` (set containment).
    pub fn has_all_skills(&self, skills: &[String]) -> bool {
        skills
            .iter()
            .all(|s| self.technical_skills.iter().any(|have| have == s))
    }
}

/// Job with the owning company's name joined in (for the public listing).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobWithCompany {
    #[serde(flatten)]
    pub job: Job,

    /// Absent when the posting user has no company record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}
