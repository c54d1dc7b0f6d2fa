//! Company registry endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;
use validator::Validate;

use jobdesk_firestore::{cascade, CompanyPatch, UniqueScope};
use jobdesk_models::{
    ApplicantInfo, ApplicationWithApplicant, Company, CompanyId, Job, JobId, UserId, UserRole,
};

use crate::auth::AuthUser;
use crate::error::{conflict_if_exists, ApiError, ApiResult};
use crate::handlers::MessageResponse;
use crate::services::JobOwnership;
use crate::state::AppState;
use crate::validation::{ValidJson, ValidQuery};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCompanyRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub company_name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub industry: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub number_of_employees: String,
    #[validate(email(message = "must be a valid email address"))]
    pub company_email: String,
}

#[derive(Serialize)]
pub struct CompanyResponse {
    pub message: String,
    pub company: Company,
}

/// POST /companies/add
///
/// One company per HR account. A second registration from the same account
/// is a conflict, not a silent second record.
pub async fn add_company(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<AddCompanyRequest>,
) -> ApiResult<(StatusCode, Json<CompanyResponse>)> {
    let user = state
        .users
        .get(&caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;

    if user.role != UserRole::CompanyHr {
        return Err(ApiError::forbidden("requires an HR account"));
    }

    if state.ownership.company_of(&caller.id).await?.is_some() {
        return Err(ApiError::conflict("account already owns a company"));
    }

    let company = Company::new(
        payload.company_name,
        payload.description,
        payload.industry,
        payload.address,
        payload.number_of_employees,
        payload.company_email,
        caller.id.clone(),
    );

    state
        .unique_keys
        .reserve(
            UniqueScope::CompanyName,
            &company.company_name,
            company.id.as_str(),
        )
        .await
        .map_err(|e| conflict_if_exists(e, "company name is already registered"))?;

    if let Err(e) = state
        .unique_keys
        .reserve(
            UniqueScope::CompanyEmail,
            &company.company_email,
            company.id.as_str(),
        )
        .await
    {
        state
            .unique_keys
            .try_release(UniqueScope::CompanyName, &company.company_name)
            .await;
        return Err(conflict_if_exists(e, "company email is already registered"));
    }

    if let Err(e) = state.companies.create(&company).await {
        state
            .unique_keys
            .try_release(UniqueScope::CompanyName, &company.company_name)
            .await;
        state
            .unique_keys
            .try_release(UniqueScope::CompanyEmail, &company.company_email)
            .await;
        return Err(e.into());
    }

    info!(company_id = %company.id, hr_id = %caller.id, "Company registered");
    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse {
            message: "Company added successfully".to_string(),
            company,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub industry: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub number_of_employees: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub company_email: Option<String>,
}

/// PUT /companies/update/:companyId
pub async fn update_company(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(company_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateCompanyRequest>,
) -> ApiResult<Json<CompanyResponse>> {
    let company = state
        .companies
        .get(&CompanyId::from_string(company_id))
        .await?
        .ok_or_else(|| ApiError::not_found("company not found"))?;

    if !company.is_owned_by(&caller.id) {
        return Err(ApiError::forbidden(
            "only the owning HR account may modify this company",
        ));
    }

    let patch = CompanyPatch {
        company_name: payload.company_name,
        description: payload.description,
        industry: payload.industry,
        address: payload.address,
        number_of_employees: payload.number_of_employees,
        company_email: payload.company_email,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("at least one field must be provided"));
    }

    let new_name = patch
        .company_name
        .as_ref()
        .filter(|n| **n != company.company_name);
    let new_email = patch
        .company_email
        .as_ref()
        .filter(|e| **e != company.company_email);

    if let Some(name) = new_name {
        state
            .unique_keys
            .reserve(UniqueScope::CompanyName, name, company.id.as_str())
            .await
            .map_err(|e| conflict_if_exists(e, "company name is already registered"))?;
    }
    if let Some(email) = new_email {
        if let Err(e) = state
            .unique_keys
            .reserve(UniqueScope::CompanyEmail, email, company.id.as_str())
            .await
        {
            if let Some(name) = new_name {
                state
                    .unique_keys
                    .try_release(UniqueScope::CompanyName, name)
                    .await;
            }
            return Err(conflict_if_exists(e, "company email is already registered"));
        }
    }

    let updated = match state.companies.update(&company.id, &patch).await {
        Ok(c) => c,
        Err(e) => {
            if let Some(name) = new_name {
                state
                    .unique_keys
                    .try_release(UniqueScope::CompanyName, name)
                    .await;
            }
            if let Some(email) = new_email {
                state
                    .unique_keys
                    .try_release(UniqueScope::CompanyEmail, email)
                    .await;
            }
            return Err(e.into());
        }
    };

    if new_name.is_some() {
        state
            .unique_keys
            .try_release(UniqueScope::CompanyName, &company.company_name)
            .await;
    }
    if new_email.is_some() {
        state
            .unique_keys
            .try_release(UniqueScope::CompanyEmail, &company.company_email)
            .await;
    }

    info!(company_id = %company.id, "Company updated");
    Ok(Json(CompanyResponse {
        message: "Company updated successfully".to_string(),
        company: updated,
    }))
}

/// DELETE /companies/delete/:companyId
///
/// Jobs (and their applications) go first, then the company record, so an
/// interrupted cascade never leaves jobs pointing at a deleted company.
pub async fn delete_company(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(company_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let company = state
        .companies
        .get(&CompanyId::from_string(company_id))
        .await?
        .ok_or_else(|| ApiError::not_found("company not found"))?;

    if !company.is_owned_by(&caller.id) {
        return Err(ApiError::forbidden(
            "only the owning HR account may delete this company",
        ));
    }

    let removed_jobs = cascade::delete_company_with_jobs(&state.firestore, &company).await?;

    info!(company_id = %company.id, removed_jobs, "Company deleted");
    Ok(Json(MessageResponse::new("Company deleted successfully")))
}

#[derive(Serialize)]
pub struct CompanyDetailsResponse {
    pub company: Company,
    pub jobs: Vec<Job>,
}

/// GET /companies/details/:companyId
pub async fn company_details(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(company_id): Path<String>,
) -> ApiResult<Json<CompanyDetailsResponse>> {
    let company = state
        .companies
        .get(&CompanyId::from_string(company_id))
        .await?
        .ok_or_else(|| ApiError::not_found("company not found"))?;

    let jobs = state.jobs.list_by_owner(&company.company_hr).await?;

    Ok(Json(CompanyDetailsResponse { company, jobs }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyNameQuery {
    pub company_name: String,
}

/// GET /companies/search
pub async fn search_companies(
    State(state): State<AppState>,
    _caller: AuthUser,
    ValidQuery(query): ValidQuery<CompanyNameQuery>,
) -> ApiResult<Json<Vec<Company>>> {
    let companies = state.companies.search_by_name(&query.company_name).await?;
    Ok(Json(companies))
}

/// GET /companies/applications/:jobId
///
/// Applications come back with the applicant's name and email joined in,
/// never the applicant's full record.
pub async fn applications_for_job(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<ApplicationWithApplicant>>> {
    let job = state
        .jobs
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    match state.ownership.job_ownership(&caller.id, &job).await? {
        JobOwnership::Owner(_) => {}
        JobOwnership::NotOwner | JobOwnership::NoCompany => {
            return Err(ApiError::forbidden(
                "only the job's owning company may view applications",
            ));
        }
    }

    let applications = state.applications.list_for_job(&job.id).await?;

    let mut seen = HashSet::new();
    let applicant_ids: Vec<UserId> = applications
        .iter()
        .map(|a| a.user_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let applicants: HashMap<UserId, ApplicantInfo> = state
        .users
        .get_many(&applicant_ids)
        .await?
        .iter()
        .map(|u| (u.id.clone(), ApplicantInfo::from(u)))
        .collect();

    let joined = applications
        .into_iter()
        .map(|application| {
            let applicant = applicants.get(&application.user_id).cloned();
            ApplicationWithApplicant {
                application,
                applicant,
            }
        })
        .collect();

    Ok(Json(joined))
}
