//! Typed repository for user documents.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::info;

use jobdesk_models::{User, UserId, UserRole, UserStatus};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Collection path for user documents.
pub const USERS_COLLECTION: &str = "users";

/// Outcome of a password reset completion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Password replaced and the code consumed.
    Completed,
    /// No account with that email.
    UserMissing,
    /// Wrong code, no pending code, or the code was consumed concurrently.
    OtpMismatch,
}

/// Partial update for a user document. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub recovery_email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile_number: Option<String>,
}

impl UserPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.recovery_email.is_none()
            && self.date_of_birth.is_none()
            && self.mobile_number.is_none()
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        let mut fields = HashMap::new();
        if let Some(v) = &self.first_name {
            fields.insert("firstName".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.last_name {
            fields.insert("lastName".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.username {
            fields.insert("username".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.email {
            fields.insert("email".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.recovery_email {
            fields.insert("recoveryEmail".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.date_of_birth {
            fields.insert("dateOfBirth".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.mobile_number {
            fields.insert("mobileNumber".to_string(), v.to_firestore_value());
        }
        fields
    }
}

/// Repository for user documents.
#[derive(Clone)]
pub struct UserRepository {
    client: FirestoreClient,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create a new user record.
    pub async fn create(&self, user: &User) -> FirestoreResult<()> {
        let fields = user_to_fields(user);
        self.client
            .create_document(USERS_COLLECTION, user.id.as_str(), fields)
            .await?;
        info!("Created user record: {}", user.id);
        Ok(())
    }

    /// Get a user by id.
    pub async fn get(&self, user_id: &UserId) -> FirestoreResult<Option<User>> {
        let doc = self
            .client
            .get_document(USERS_COLLECTION, user_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_user(&d)?)),
            None => Ok(None),
        }
    }

    /// Fetch several users at once. Missing ids are skipped.
    pub async fn get_many(&self, ids: &[UserId]) -> FirestoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<String> = ids
            .iter()
            .map(|id| self.client.full_document_name(USERS_COLLECTION, id.as_str()))
            .collect();

        let mut users = Vec::with_capacity(names.len());
        for chunk in names.chunks(100) {
            let docs = self.client.batch_get_documents(chunk.to_vec(), None).await?;
            for doc in &docs {
                users.push(document_to_user(doc)?);
            }
        }
        Ok(users)
    }

    /// Look up a user by email.
    pub async fn find_by_email(&self, email: &str) -> FirestoreResult<Option<User>> {
        let query = StructuredQuery::collection(USERS_COLLECTION)
            .where_eq("email", email.to_firestore_value())
            .limit(1);

        let docs = self.client.run_query(query).await?;
        match docs.first() {
            Some(d) => Ok(Some(document_to_user(d)?)),
            None => Ok(None),
        }
    }

    /// Look up a user by mobile number.
    pub async fn find_by_mobile(&self, mobile_number: &str) -> FirestoreResult<Option<User>> {
        let query = StructuredQuery::collection(USERS_COLLECTION)
            .where_eq("mobileNumber", mobile_number.to_firestore_value())
            .limit(1);

        let docs = self.client.run_query(query).await?;
        match docs.first() {
            Some(d) => Ok(Some(document_to_user(d)?)),
            None => Ok(None),
        }
    }

    /// List users registered with the given recovery email.
    pub async fn list_by_recovery_email(&self, recovery_email: &str) -> FirestoreResult<Vec<User>> {
        let query = StructuredQuery::collection(USERS_COLLECTION)
            .where_eq("recoveryEmail", recovery_email.to_firestore_value());

        let docs = self.client.run_query(query).await?;
        docs.iter().map(document_to_user).collect()
    }

    /// Apply a partial update and return the updated user.
    pub async fn update(&self, user_id: &UserId, patch: &UserPatch) -> FirestoreResult<User> {
        let mut fields = patch.to_fields();
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());
        let mask: Vec<String> = fields.keys().cloned().collect();

        let doc = self
            .client
            .update_document(USERS_COLLECTION, user_id.as_str(), fields, Some(mask))
            .await?;
        document_to_user(&doc)
    }

    /// Set the presence status.
    pub async fn set_status(&self, user_id: &UserId, status: UserStatus) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("status".to_string(), status.as_str().to_firestore_value());
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document(
                USERS_COLLECTION,
                user_id.as_str(),
                fields,
                Some(vec!["status".to_string(), "updatedAt".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Replace the stored password digest.
    pub async fn set_password(&self, user_id: &UserId, password_digest: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("password".to_string(), password_digest.to_firestore_value());
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document(
                USERS_COLLECTION,
                user_id.as_str(),
                fields,
                Some(vec!["password".to_string(), "updatedAt".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Store a pending password reset code on the account.
    pub async fn set_reset_code(&self, user_id: &UserId, otp: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("otp".to_string(), otp.to_firestore_value());
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document(
                USERS_COLLECTION,
                user_id.as_str(),
                fields,
                Some(vec!["otp".to_string(), "updatedAt".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Verify a reset code and replace the password, consuming the code.
    ///
    /// The write carries the update time observed when the code was checked,
    /// so a concurrent completion invalidates this attempt instead of
    /// applying the new password twice. Masking `otp` without supplying it
    /// deletes the field in the same write.
    pub async fn complete_password_reset(
        &self,
        email: &str,
        otp: &str,
        new_password_digest: &str,
    ) -> FirestoreResult<ResetOutcome> {
        let query = StructuredQuery::collection(USERS_COLLECTION)
            .where_eq("email", email.to_firestore_value())
            .limit(1);

        let docs = self.client.run_query(query).await?;
        let doc = match docs.into_iter().next() {
            Some(d) => d,
            None => return Ok(ResetOutcome::UserMissing),
        };

        let stored_otp = doc
            .fields
            .as_ref()
            .and_then(|f| f.get("otp"))
            .and_then(String::from_firestore_value);
        if stored_otp.as_deref() != Some(otp) {
            return Ok(ResetOutcome::OtpMismatch);
        }

        let doc_id = doc
            .doc_id()
            .ok_or_else(|| FirestoreError::InvalidResponse("User document has no name".to_string()))?
            .to_string();

        let mut fields = HashMap::new();
        fields.insert(
            "password".to_string(),
            new_password_digest.to_firestore_value(),
        );
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());

        let mask = vec![
            "password".to_string(),
            "otp".to_string(),
            "updatedAt".to_string(),
        ];

        match self
            .client
            .update_document_with_precondition(
                USERS_COLLECTION,
                &doc_id,
                fields,
                Some(mask),
                doc.update_time.as_deref(),
            )
            .await
        {
            Ok(_) => {
                info!("Password reset completed for user {}", doc_id);
                Ok(ResetOutcome::Completed)
            }
            Err(e) if e.is_precondition_failed() => Ok(ResetOutcome::OtpMismatch),
            Err(e) => Err(e),
        }
    }
}

// Helper functions for conversion

pub(crate) fn user_to_fields(user: &User) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("firstName".to_string(), user.first_name.to_firestore_value());
    fields.insert("lastName".to_string(), user.last_name.to_firestore_value());
    fields.insert("username".to_string(), user.username.to_firestore_value());
    fields.insert("email".to_string(), user.email.to_firestore_value());
    fields.insert("password".to_string(), user.password.to_firestore_value());
    fields.insert(
        "recoveryEmail".to_string(),
        user.recovery_email.to_firestore_value(),
    );
    fields.insert(
        "dateOfBirth".to_string(),
        user.date_of_birth.to_firestore_value(),
    );
    fields.insert(
        "mobileNumber".to_string(),
        user.mobile_number.to_firestore_value(),
    );
    fields.insert("role".to_string(), user.role.as_str().to_firestore_value());
    fields.insert(
        "status".to_string(),
        user.status.as_str().to_firestore_value(),
    );
    if let Some(otp) = &user.otp {
        fields.insert("otp".to_string(), otp.to_firestore_value());
    }
    fields.insert("createdAt".to_string(), user.created_at.to_firestore_value());
    fields.insert("updatedAt".to_string(), user.updated_at.to_firestore_value());
    fields
}

pub(crate) fn document_to_user(doc: &Document) -> FirestoreResult<User> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("Document has no fields".to_string()))?;
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::InvalidResponse("Document has no name".to_string()))?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };

    Ok(User {
        id: UserId::from_string(id),
        first_name: get_string("firstName"),
        last_name: get_string("lastName"),
        username: get_string("username"),
        email: get_string("email"),
        password: get_string("password"),
        recovery_email: get_string("recoveryEmail"),
        date_of_birth: fields
            .get("dateOfBirth")
            .and_then(NaiveDate::from_firestore_value)
            .unwrap_or_default(),
        mobile_number: get_string("mobileNumber"),
        role: UserRole::parse(&get_string("role")).unwrap_or_default(),
        status: UserStatus::parse(&get_string("status")).unwrap_or_default(),
        otp: fields.get("otp").and_then(String::from_firestore_value),
        created_at: fields
            .get("createdAt")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
        updated_at: fields
            .get("updatedAt")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "Amira",
            "Khaled",
            "amira.k",
            "amira@jobdesk.io",
            "$2b$10$digest",
            "backup@jobdesk.io",
            NaiveDate::from_ymd_opt(1994, 6, 12).unwrap(),
            "+201001234567",
            UserRole::CompanyHr,
        )
    }

    #[test]
    fn user_fields_use_wire_names() {
        let user = sample_user();
        let fields = user_to_fields(&user);

        assert!(fields.contains_key("firstName"));
        assert!(fields.contains_key("recoveryEmail"));
        assert!(fields.contains_key("dateOfBirth"));
        assert!(fields.contains_key("mobileNumber"));
        assert!(fields.contains_key("password"));
        assert!(
            !fields.contains_key("otp"),
            "otp should be absent until a reset is initiated"
        );
    }

    #[test]
    fn user_document_roundtrip() {
        let user = sample_user();
        let doc = Document {
            name: Some(format!(
                "projects/p/databases/(default)/documents/users/{}",
                user.id.as_str()
            )),
            fields: Some(user_to_fields(&user)),
            create_time: None,
            update_time: None,
        };

        let parsed = document_to_user(&doc).unwrap();
        assert_eq!(parsed.id, user.id);
        assert_eq!(parsed.email, user.email);
        assert_eq!(parsed.date_of_birth, user.date_of_birth);
        assert_eq!(parsed.role, UserRole::CompanyHr);
        assert_eq!(parsed.status, UserStatus::Offline);
        assert_eq!(parsed.otp, None);
    }

    #[test]
    fn patch_reports_empty() {
        assert!(UserPatch::default().is_empty());

        let patch = UserPatch {
            username: Some("new.name".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(patch.to_fields().contains_key("username"));
        assert_eq!(patch.to_fields().len(), 1);
    }
}
