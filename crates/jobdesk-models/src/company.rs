//! Company models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::user::UserId;

/// Unique identifier for a company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl CompanyId {
    /// Generate a new random company ID.
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

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CompanyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CompanyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Company record stored in Firestore.
///
/// `company_hr` is the owning user and is immutable after creation; every
/// job posted by that user belongs to this company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Unique company ID
    pub id: CompanyId,

    /// Globally unique
    pub company_name: String,

    pub description: String,

    pub industry: String,

    pub address: String,

    /// Free-form size bracket, e.g. "11-50"
    pub number_of_employees: String,

    /// Globally unique
    pub company_email: String,

    /// Owning HR user, immutable
    #[serde(rename = "companyHR")]
    pub company_hr: UserId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Create a new company record owned by `company_hr`.
    pub fn new(
        company_name: impl Into<String>,
        description: impl Into<String>,
        industry: impl Into<String>,
        address: impl Into<String>,
        number_of_employees: impl Into<String>,
        company_email: impl Into<String>,
        company_hr: UserId,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: CompanyId::new(),
            company_name: company_name.into(),
            description: description.into(),
            industry: industry.into(),
            address: address.into(),
            number_of_employees: number_of_employees.into(),
            company_email: company_email.into(),
            company_hr,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` is the owning HR user.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.company_hr == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_ownership() {
        let owner = UserId::new();
        let other = UserId::new();
        let company = Company::new(
            "Nile Systems",
            "Embedded tooling",
            "Software",
            "Cairo, Egypt",
            "11-50",
            "jobs@nilesystems.example",
            owner.clone(),
        );

        assert!(company.is_owned_by(&owner));
        assert!(!company.is_owned_by(&other));
    }

    #[test]
    fn test_company_hr_wire_spelling() {
        let company = Company::new(
            "Nile Systems",
            "Embedded tooling",
            "Software",
            "Cairo, Egypt",
            "11-50",
            "jobs@nilesystems.example",
            UserId::from("u-1"),
        );
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["companyHR"], "u-1");
        assert_eq!(json["companyName"], "Nile Systems");
    }
}
