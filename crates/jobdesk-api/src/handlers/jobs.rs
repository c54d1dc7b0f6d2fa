//! Job registry endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use validator::Validate;

use jobdesk_firestore::{cascade, JobPatch, JobSearch};
use jobdesk_models::{
    Application, Job, JobId, JobLocation, JobWithCompany, SeniorityLevel, UserId, WorkingTime,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::MessageResponse;
use crate::services::JobOwnership;
use crate::state::AppState;
use crate::validation::{ValidJson, ValidQuery};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddJobRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub job_title: String,
    pub job_location: JobLocation,
    pub working_time: WorkingTime,
    pub seniority_level: SeniorityLevel,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub job_description: String,
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: Job,
}

/// POST /jobs/add
///
/// Publishing requires an owned company; the job's `addedBy` is the caller.
pub async fn add_job(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<AddJobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    if state.ownership.company_of(&caller.id).await?.is_none() {
        return Err(ApiError::forbidden(
            "posting jobs requires a registered company",
        ));
    }

    let job = Job::new(
        payload.job_title,
        payload.job_location,
        payload.working_time,
        payload.seniority_level,
        payload.job_description,
        payload.technical_skills,
        payload.soft_skills,
        caller.id.clone(),
    );

    state.jobs.create(&job).await?;

    info!(job_id = %job.id, hr_id = %caller.id, "Job posted");
    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            message: "Job added successfully".to_string(),
            job,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub job_title: Option<String>,
    pub job_location: Option<JobLocation>,
    pub working_time: Option<WorkingTime>,
    pub seniority_level: Option<SeniorityLevel>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub job_description: Option<String>,
    pub technical_skills: Option<Vec<String>>,
    pub soft_skills: Option<Vec<String>>,
}

/// PUT /jobs/update/:jobId
pub async fn update_job(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(job_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateJobRequest>,
) -> ApiResult<Json<JobResponse>> {
    let job = state
        .jobs
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    require_owner(&state, &caller.id, &job).await?;

    let patch = JobPatch {
        job_title: payload.job_title,
        job_location: payload.job_location,
        working_time: payload.working_time,
        seniority_level: payload.seniority_level,
        job_description: payload.job_description,
        technical_skills: payload.technical_skills,
        soft_skills: payload.soft_skills,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("at least one field must be provided"));
    }

    let updated = state.jobs.update(&job.id, &patch).await?;

    info!(job_id = %job.id, "Job updated");
    Ok(Json(JobResponse {
        message: "Job updated successfully".to_string(),
        job: updated,
    }))
}

/// DELETE /jobs/delete/:jobId
///
/// Applications referencing the job go first, then the job itself.
pub async fn delete_job(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let job = state
        .jobs
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    require_owner(&state, &caller.id, &job).await?;

    let removed = cascade::delete_job_with_applications(&state.firestore, &job.id).await?;

    info!(job_id = %job.id, removed_applications = removed, "Job deleted");
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}

/// GET /jobs/all
///
/// Joins the owning company's name onto each job. Postings whose owner has
/// no company record come back without one.
pub async fn list_all_jobs(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<JobWithCompany>>> {
    let jobs = state.jobs.list_all().await?;

    let names: HashMap<UserId, String> = state
        .companies
        .list()
        .await?
        .into_iter()
        .map(|c| (c.company_hr, c.company_name))
        .collect();

    let joined = jobs
        .into_iter()
        .map(|job| {
            let company_name = names.get(&job.added_by).cloned();
            JobWithCompany { job, company_name }
        })
        .collect();

    Ok(Json(joined))
}

/// GET /jobs/by-company
pub async fn list_jobs_by_company(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<Job>>> {
    if state.ownership.company_of(&caller.id).await?.is_none() {
        return Err(ApiError::not_found("no company registered for this account"));
    }

    let jobs = state.jobs.list_by_owner(&caller.id).await?;
    Ok(Json(jobs))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterJobsQuery {
    pub working_time: Option<WorkingTime>,
    pub job_location: Option<JobLocation>,
    pub seniority_level: Option<SeniorityLevel>,
    pub job_title: Option<String>,
    /// Comma-separated. A job matches only if it lists every named skill.
    pub technical_skills: Option<String>,
}

/// GET /jobs/filter
pub async fn filter_jobs(
    State(state): State<AppState>,
    _caller: AuthUser,
    ValidQuery(query): ValidQuery<FilterJobsQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    let technical_skills = query
        .technical_skills
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let search = JobSearch {
        job_title: query.job_title,
        job_location: query.job_location,
        working_time: query.working_time,
        seniority_level: query.seniority_level,
        technical_skills,
    };

    let jobs = state.jobs.search(&search).await?;
    Ok(Json(jobs))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub job_id: String,
    pub user_tech_skills: Vec<String>,
    pub user_soft_skills: Vec<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub user_resume: String,
}

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub message: String,
    pub application: Application,
}

/// POST /jobs/apply
///
/// Repeat applications to the same job are allowed.
pub async fn apply_to_job(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<ApplicationResponse>)> {
    let job = state
        .jobs
        .get(&JobId::from_string(payload.job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    let application = Application::new(
        job.id.clone(),
        caller.id.clone(),
        payload.user_tech_skills,
        payload.user_soft_skills,
        payload.user_resume,
    );

    state.applications.create(&application).await?;

    info!(application_id = %application.id, job_id = %job.id, "Application submitted");
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            message: "Application submitted successfully".to_string(),
            application,
        }),
    ))
}

/// Transitive ownership gate shared by the mutating job routes.
async fn require_owner(state: &AppState, caller: &UserId, job: &Job) -> ApiResult<()> {
    match state.ownership.job_ownership(caller, job).await? {
        JobOwnership::Owner(_) => Ok(()),
        JobOwnership::NotOwner | JobOwnership::NoCompany => Err(ApiError::forbidden(
            "only the posting company may manage this job",
        )),
    }
}
