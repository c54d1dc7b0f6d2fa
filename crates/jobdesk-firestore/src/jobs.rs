//! Typed repository for job documents.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use jobdesk_models::{Job, JobId, JobLocation, SeniorityLevel, UserId, WorkingTime};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Collection path for job documents.
pub const JOBS_COLLECTION: &str = "jobs";

/// Filter criteria for job searches. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct JobSearch {
    pub job_title: Option<String>,
    pub job_location: Option<JobLocation>,
    pub working_time: Option<WorkingTime>,
    pub seniority_level: Option<SeniorityLevel>,
    pub technical_skills: Vec<String>,
}

/// Partial update for a job document. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub job_title: Option<String>,
    pub job_location: Option<JobLocation>,
    pub working_time: Option<WorkingTime>,
    pub seniority_level: Option<SeniorityLevel>,
    pub job_description: Option<String>,
    pub technical_skills: Option<Vec<String>>,
    pub soft_skills: Option<Vec<String>>,
}

impl JobPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.job_title.is_none()
            && self.job_location.is_none()
            && self.working_time.is_none()
            && self.seniority_level.is_none()
            && self.job_description.is_none()
            && self.technical_skills.is_none()
            && self.soft_skills.is_none()
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        let mut fields = HashMap::new();
        if let Some(v) = &self.job_title {
            fields.insert("jobTitle".to_string(), v.to_firestore_value());
        }
        if let Some(v) = self.job_location {
            fields.insert("jobLocation".to_string(), v.as_str().to_firestore_value());
        }
        if let Some(v) = self.working_time {
            fields.insert("workingTime".to_string(), v.as_str().to_firestore_value());
        }
        if let Some(v) = self.seniority_level {
            fields.insert(
                "seniorityLevel".to_string(),
                v.as_str().to_firestore_value(),
            );
        }
        if let Some(v) = &self.job_description {
            fields.insert("jobDescription".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.technical_skills {
            fields.insert("technicalSkills".to_string(), v.to_firestore_value());
        }
        if let Some(v) = &self.soft_skills {
            fields.insert("softSkills".to_string(), v.to_firestore_value());
        }
        fields
    }
}

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create a new job record.
    pub async fn create(&self, job: &Job) -> FirestoreResult<()> {
        let fields = job_to_fields(job);
        self.client
            .create_document(JOBS_COLLECTION, job.id.as_str(), fields)
            .await?;
        info!("Created job record: {}", job.id);
        Ok(())
    }

    /// Get a job by id.
    pub async fn get(&self, job_id: &JobId) -> FirestoreResult<Option<Job>> {
        let doc = self
            .client
            .get_document(JOBS_COLLECTION, job_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_job(&d)?)),
            None => Ok(None),
        }
    }

    /// List every job, newest first.
    pub async fn list_all(&self) -> FirestoreResult<Vec<Job>> {
        let query =
            StructuredQuery::collection(JOBS_COLLECTION).order_by("createdAt", "DESCENDING");
        let docs = self.client.run_query(query).await?;
        docs.iter().map(document_to_job).collect()
    }

    /// List jobs published by the given HR account.
    pub async fn list_by_owner(&self, hr_id: &UserId) -> FirestoreResult<Vec<Job>> {
        let query = StructuredQuery::collection(JOBS_COLLECTION)
            .where_eq("addedBy", hr_id.as_str().to_firestore_value());
        let docs = self.client.run_query(query).await?;
        docs.iter().map(document_to_job).collect()
    }

    /// Search jobs by the given criteria.
    ///
    /// Equality criteria and the first technical skill run server side;
    /// Firestore allows a single ARRAY_CONTAINS per query and no substring
    /// matching, so the remaining skills and the title are matched in
    /// process on the result set.
    pub async fn search(&self, search: &JobSearch) -> FirestoreResult<Vec<Job>> {
        let mut query = StructuredQuery::collection(JOBS_COLLECTION);

        if let Some(wt) = search.working_time {
            query = query.where_eq("workingTime", wt.as_str().to_firestore_value());
        }
        if let Some(loc) = search.job_location {
            query = query.where_eq("jobLocation", loc.as_str().to_firestore_value());
        }
        if let Some(level) = search.seniority_level {
            query = query.where_eq("seniorityLevel", level.as_str().to_firestore_value());
        }
        if let Some(first_skill) = search.technical_skills.first() {
            query = query.where_array_contains("technicalSkills", first_skill.to_firestore_value());
        }

        let docs = self.client.run_query(query).await?;
        let jobs: Vec<Job> = docs
            .iter()
            .map(document_to_job)
            .collect::<FirestoreResult<_>>()?;

        Ok(jobs
            .into_iter()
            .filter(|job| {
                search
                    .job_title
                    .as_deref()
                    .map(|needle| job.title_matches(needle))
                    .unwrap_or(true)
                    && job.has_all_skills(&search.technical_skills)
            })
            .collect())
    }

    /// Apply a partial update and return the updated job.
    pub async fn update(&self, job_id: &JobId, patch: &JobPatch) -> FirestoreResult<Job> {
        let mut fields = patch.to_fields();
        fields.insert("updatedAt".to_string(), Utc::now().to_firestore_value());
        let mask: Vec<String> = fields.keys().cloned().collect();

        let doc = self
            .client
            .update_document(JOBS_COLLECTION, job_id.as_str(), fields, Some(mask))
            .await?;
        document_to_job(&doc)
    }
}

// Helper functions for conversion

pub(crate) fn job_to_fields(job: &Job) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("jobTitle".to_string(), job.job_title.to_firestore_value());
    fields.insert(
        "jobLocation".to_string(),
        job.job_location.as_str().to_firestore_value(),
    );
    fields.insert(
        "workingTime".to_string(),
        job.working_time.as_str().to_firestore_value(),
    );
    fields.insert(
        "seniorityLevel".to_string(),
        job.seniority_level.as_str().to_firestore_value(),
    );
    fields.insert(
        "jobDescription".to_string(),
        job.job_description.to_firestore_value(),
    );
    fields.insert(
        "technicalSkills".to_string(),
        job.technical_skills.to_firestore_value(),
    );
    fields.insert(
        "softSkills".to_string(),
        job.soft_skills.to_firestore_value(),
    );
    fields.insert(
        "addedBy".to_string(),
        job.added_by.as_str().to_firestore_value(),
    );
    fields.insert("createdAt".to_string(), job.created_at.to_firestore_value());
    fields.insert("updatedAt".to_string(), job.updated_at.to_firestore_value());
    fields
}

pub(crate) fn document_to_job(doc: &Document) -> FirestoreResult<Job> {
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

    Ok(Job {
        id: JobId::from_string(id),
        job_title: get_string("jobTitle"),
        job_location: JobLocation::parse(&get_string("jobLocation")).unwrap_or(JobLocation::Onsite),
        working_time: WorkingTime::parse(&get_string("workingTime"))
            .unwrap_or(WorkingTime::FullTime),
        seniority_level: SeniorityLevel::parse(&get_string("seniorityLevel"))
            .unwrap_or(SeniorityLevel::Junior),
        job_description: get_string("jobDescription"),
        technical_skills: get_skills("technicalSkills"),
        soft_skills: get_skills("softSkills"),
        added_by: UserId::from_string(get_string("addedBy")),
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
