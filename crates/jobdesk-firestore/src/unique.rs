//! Unique value reservations.
//!
//! Firestore has no unique indexes. Uniqueness is enforced by reserving a
//! document whose id encodes the scoped value in the `unique_keys`
//! collection: creation fails with `AlreadyExists` when another owner holds
//! the reservation. Callers reserve before writing the owning entity and
//! release when the value changes or the entity is deleted.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::ToFirestoreValue;

/// Collection holding reservation documents.
pub const UNIQUE_KEYS_COLLECTION: &str = "unique_keys";

/// Namespaces for reserved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueScope {
    UserEmail,
    UserMobile,
    CompanyName,
    CompanyEmail,
}

impl UniqueScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueScope::UserEmail => "user_email",
            UniqueScope::UserMobile => "user_mobile",
            UniqueScope::CompanyName => "company_name",
            UniqueScope::CompanyEmail => "company_email",
        }
    }
}

/// Document id for a reservation.
///
/// The value is percent-encoded since Firestore document ids cannot contain
/// `/`, and the scope prefix keeps `user_email` and `company_email` values
/// from colliding.
pub fn reservation_doc_id(scope: UniqueScope, value: &str) -> String {
    format!("{}:{}", scope.as_str(), urlencoding::encode(value))
}

/// Repository for unique value reservations.
#[derive(Clone)]
pub struct UniqueKeyRepository {
    client: FirestoreClient,
}

impl UniqueKeyRepository {
    /// Create a new unique key repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Reserve `value` within `scope` for `owner_id`.
    ///
    /// Fails with `AlreadyExists` if the value is already held.
    pub async fn reserve(
        &self,
        scope: UniqueScope,
        value: &str,
        owner_id: &str,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("ownerId".to_string(), owner_id.to_firestore_value());
        fields.insert("reservedAt".to_string(), Utc::now().to_firestore_value());

        self.client
            .create_document(
                UNIQUE_KEYS_COLLECTION,
                &reservation_doc_id(scope, value),
                fields,
            )
            .await?;

        info!("Reserved {} value for owner {}", scope.as_str(), owner_id);
        Ok(())
    }

    /// Release a reservation. Releasing a value nobody holds succeeds.
    pub async fn release(&self, scope: UniqueScope, value: &str) -> FirestoreResult<()> {
        self.client
            .delete_document(UNIQUE_KEYS_COLLECTION, &reservation_doc_id(scope, value))
            .await
    }

    /// Best-effort release for compensation paths. A failed release leaves
    /// an orphaned reservation, which blocks the value until cleaned up;
    /// that is logged rather than surfaced to the caller.
    pub async fn try_release(&self, scope: UniqueScope, value: &str) {
        if let Err(e) = self.release(scope, value).await {
            warn!("Failed to release {} reservation: {}", scope.as_str(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_doc_id_encodes_value() {
        assert_eq!(
            reservation_doc_id(UniqueScope::UserEmail, "jane@corp.com"),
            "user_email:jane%40corp.com"
        );
        assert_eq!(
            reservation_doc_id(UniqueScope::CompanyName, "Acme / Rocket Division"),
            "company_name:Acme%20%2F%20Rocket%20Division"
        );
    }

    #[test]
    fn test_scopes_do_not_collide() {
        let user = reservation_doc_id(UniqueScope::UserEmail, "hr@corp.com");
        let company = reservation_doc_id(UniqueScope::CompanyEmail, "hr@corp.com");
        assert_ne!(user, company);
    }
}
