//! Typed repository for job application documents.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use jobdesk_models::{Application, ApplicationId, JobId, UserId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Collection path for application documents.
pub const APPLICATIONS_COLLECTION: &str = "applications";

/// Repository for application documents.
#[derive(Clone)]
pub struct ApplicationRepository {
    client: FirestoreClient,
}

impl ApplicationRepository {
    /// Create a new application repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create a new application record.
    pub async fn create(&self, application: &Application) -> FirestoreResult<()> {
        let fields = application_to_fields(application);
        self.client
            .create_document(APPLICATIONS_COLLECTION, application.id.as_str(), fields)
            .await?;
        info!(
            "Created application {} for job {}",
            application.id, application.job_id
        );
        Ok(())
    }

    /// List applications submitted to a job.
    pub async fn list_for_job(&self, job_id: &JobId) -> FirestoreResult<Vec<Application>> {
        let query = StructuredQuery::collection(APPLICATIONS_COLLECTION)
            .where_eq("jobId", job_id.as_str().to_firestore_value());

        let docs = self.client.run_query(query).await?;
        docs.iter().map(document_to_application).collect()
    }
}

// Helper functions for conversion

pub(crate) fn application_to_fields(application: &Application) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "jobId".to_string(),
        application.job_id.as_str().to_firestore_value(),
    );
    fields.insert(
        "userId".to_string(),
        application.user_id.as_str().to_firestore_value(),
    );
    fields.insert(
        "userTechSkills".to_string(),
        application.user_tech_skills.to_firestore_value(),
    );
    fields.insert(
        "userSoftSkills".to_string(),
        application.user_soft_skills.to_firestore_value(),
    );
    fields.insert(
        "userResume".to_string(),
        application.user_resume.to_firestore_value(),
    );
    fields.insert(
        "createdAt".to_string(),
        application.created_at.to_firestore_value(),
    );
    fields
}

pub(crate) fn document_to_application(doc: &Document) -> FirestoreResult<Application> {
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

    let get_skills = |key: &str| -> Vec<String> {
        fields
            .get(key)
            .and_then(Vec::<String>::from_firestore_value)
            .unwrap_or_default()
    };

    Ok(Application {
        id: ApplicationId::from_string(id),
        job_id: JobId::from_string(get_string("jobId")),
        user_id: UserId::from_string(get_string("userId")),
        user_tech_skills: get_skills("userTechSkills"),
        user_soft_skills: get_skills("userSoftSkills"),
        user_resume: get_string("userResume"),
        created_at: fields
            .get("createdAt")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
    })
}
