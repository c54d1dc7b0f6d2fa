//! Ownership resolution.
//!
//! HR capability is structural, not a role flag: an account manages exactly
//! the company whose `companyHR` field carries its id, and manages a job when
//! that company's owner id equals the job's `addedBy`. The one-company-per-
//! account invariant keeps the resolution unambiguous.

use jobdesk_firestore::CompanyRepository;
use jobdesk_models::{Company, Job, UserId};

use crate::error::ApiResult;

/// Outcome of the transitive caller-to-company-to-job check.
#[derive(Debug)]
pub enum JobOwnership {
    /// Caller owns the company that published the job.
    Owner(Company),
    /// Caller owns a company, but not the one behind this job.
    NotOwner,
    /// Caller owns no company at all.
    NoCompany,
}

/// Resolves which company, if any, backs a caller's HR actions.
#[derive(Clone)]
pub struct OwnershipService {
    companies: CompanyRepository,
}

impl OwnershipService {
    pub fn new(companies: CompanyRepository) -> Self {
        Self { companies }
    }

    /// The company owned by this account, if any.
    pub async fn company_of(&self, user_id: &UserId) -> ApiResult<Option<Company>> {
        Ok(self.companies.find_by_hr(user_id).await?)
    }

    /// Resolve whether `caller` may manage `job`.
    pub async fn job_ownership(&self, caller: &UserId, job: &Job) -> ApiResult<JobOwnership> {
        match self.company_of(caller).await? {
            Some(company) if job.added_by == company.company_hr => {
                Ok(JobOwnership::Owner(company))
            }
            Some(_) => Ok(JobOwnership::NotOwner),
            None => Ok(JobOwnership::NoCompany),
        }
    }
}
