//! Typed repository for company documents.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use jobdesk_models::{Company, CompanyId, UserId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Collection path for company documents.
pub const COMPANIES_COLLECTION: &str = "companies";

/// Partial update for a company document. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub number_of_employees: Option<String>,
    pub company_email: Option<String>,
}

impl CompanyPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.description.is_none()
            && self.industry.is_none()
            && self.address.is_none()
            && self.number_of_employees.is_none()
            && self.company_email.is_none()
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        let mut fields = HashMap::new();
        if let Some(v) = &self.company_name {
            fields.insert("companyName".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.description {
            fields.insert("description".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.industry {
            fields.insert("industry".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.address {
            fields.insert("address".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.number_of_employees {
            fields.insert("numberOfEmployees".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.company_email {
            fields.insert("companyEmail".to_string(), v.to_firestore_value());
        }
        fields
    }
}

/// Repository for company documents.
#[derive(Clone)]
pub struct CompanyRepository {
    client: FirestoreClient,
}

impl CompanyRepository {
    /// Create a new company repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create a new company record.
    pub async fn create(&self, company: &Company) -> FirestoreResult<()> {
        let fields = company_to_fields(company);
        self.client
            .create_document(COMPANIES_COLLECTION, company.id.as_str(), fields)
            .await?;
        info!("Created company record: {}", company.id);
        Ok(())
    }

    /// Get a company by id.
    pub async fn get(&self, company_id: &CompanyId) -> FirestoreResult<Option<Company>> {
        let doc = self
            .client
            .get_document(COMPANIES_COLLECTION, company_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_company(&d)?)),
            None => Ok(None),
        }
    }

    /// List every company.
    pub async fn list(&self) -> FirestoreResult<Vec<Company>> {
        let docs = self
            .client
            .run_query(StructuredQuery::collection(COMPANIES_COLLECTION))
            .await?;
        docs.iter().map(document_to_company).collect()
    }

    /// Exact-match lookup on the registered company name.
    pub async fn search_by_name(&self, company_name: &str) -> FirestoreResult<Vec<Company>> {
        let query = StructuredQuery::collection(COMPANIES_COLLECTION)
            .where_eq("companyName", company_name.to_firestore_value());

        let docs = self.client.run_query(query).await?;
        docs.iter().map(document_to_company).collect()
    }

    /// Find the company owned by the given HR account, if any.
    pub async fn find_by_hr(&self, hr_id: &UserId) -> FirestoreResult<Option<Company>> {
        let query = StructuredQuery::collection(COMPANIES_COLLECTION)
            .where_eq("companyHR", hr_id.as_str().to_firestore_value())
            .limit(1);

        let docs = self.client.run_query(query).await?;
        match docs.first() {
            Some(d) => Ok(Some(document_to_company(d)?)),
            None => Ok(None),
        }
    }

    /// Apply a partial update and return the updated company.
    pub async fn update(
        &self,
        company_id: &CompanyId,
        patch: &CompanyPatch,
    ) -> FirestoreResult<Company> {
        let mut fields = patch.to_fields();
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());
        let mask: Vec<String> = fields.keys().cloned().collect();

        let doc = self
            .client
            .update_document(COMPANIES_COLLECTION, company_id.as_str(), fields, Some(mask))
            .await?;
        document_to_company(&doc)
    }
}

// Helper functions for conversion

pub(crate) fn company_to_fields(company: &Company) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "companyName".to_string(),
        company.company_name.to_firestore_value(),
    );
    fields.insert(
        "description".to_string(),
        company.description.to_firestore_value(),
    );
    fields.insert("industry".to_string(), company.industry.to_firestore_value());
    fields.insert("address".to_string(), company.address.to_firestore_value());
    fields.insert(
        "numberOfEmployees".to_string(),
        company.number_of_employees.to_firestore_value(),
    );
    fields.insert(
        "companyEmail".to_string(),
        company.company_email.to_firestore_value(),
    );
    fields.insert(
        "companyHR".to_string(),
        company.company_hr.as_str().to_firestore_value(),
    );
    fields.insert(
        "createdAt".to_string(),
        company.created_at.to_firestore_value(),
    );
    fields.insert(
        "updatedAt".to_string(),
        company.updated_at.to_firestore_value(),
    );
    fields
}

pub(crate) fn document_to_company(doc: &Document) -> FirestoreResult<Company> {
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

    Ok(Company {
        id: CompanyId::from_string(id),
        company_name: get_string("companyName"),
        description: get_string("description"),
        industry: get_string("industry"),
        address: get_string("address"),
        number_of_employees: get_string("numberOfEmployees"),
        company_email: get_string("companyEmail"),
        company_hr: UserId::from_string(get_string("companyHR")),
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

    fn sample_company() -> Company {
        Company::new(
            "Nimbus Analytics",
            "Cloud cost intelligence",
            "Software",
            "12 Harbour St, Valletta",
            "51-200",
            "people@nimbus.example",
            UserId::from_string("hr-1"),
        )
    }

    #[test]
    fn company_fields_use_wire_names() {
        let company = sample_company();
        let fields = company_to_fields(&company);

        assert!(fields.contains_key("companyName"));
        assert!(fields.contains_key("numberOfEmployees"));
        assert!(
            fields.contains_key("companyHR"),
            "owner field keeps its HR capitalization"
        );
    }

    #[test]
    fn company_document_roundtrip() {
        let company = sample_company();
        let doc = Document {
            name: Some(format!(
                "projects/p/databases/(default)/documents/companies/{}",
                company.id.as_str()
            )),
            fields: Some(company_to_fields(&company)),
            create_time: None,
            update_time: None,
        };

        let parsed = document_to_company(&doc).unwrap();
        assert_eq!(parsed.id, company.id);
        assert_eq!(parsed.company_name, company.company_name);
        assert_eq!(parsed.company_hr, company.company_hr);
        assert!(parsed.is_owned_by(&UserId::from_string("hr-1")));
    }

    #[test]
    fn patch_reports_empty() {
        assert!(CompanyPatch::default().is_empty());

        let patch = CompanyPatch {
            address: Some("Remote".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.to_fields().len(), 1);
    }
}
