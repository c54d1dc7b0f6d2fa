//! Multi-document cascade deletes.
//!
//! Firestore has no relational cascades, so deleting an entity removes its
//! dependents through explicit batch writes, chunked under the 500-write
//! limit. Writes stay ordered with the owning document last: a cascade that
//! fails partway leaves the owner in place to retry rather than orphaning
//! dependents.

use std::collections::HashSet;

use tracing::info;

use jobdesk_models::{Company, JobId, User, UserId};

use crate::applications::APPLICATIONS_COLLECTION;
use crate::client::FirestoreClient;
use crate::companies::COMPANIES_COLLECTION;
use crate::error::FirestoreResult;
use crate::jobs::JOBS_COLLECTION;
use crate::types::{StructuredQuery, ToFirestoreValue, Write};
use crate::unique::{reservation_doc_id, UniqueScope, UNIQUE_KEYS_COLLECTION};
use crate::users::USERS_COLLECTION;

/// Firestore caps batchWrite at 500 writes.
const BATCH_WRITE_LIMIT: usize = 500;

/// Delete a job together with every application submitted to it.
///
/// Returns the number of applications removed.
pub async fn delete_job_with_applications(
    client: &FirestoreClient,
    job_id: &JobId,
) -> FirestoreResult<u64> {
    let mut writes = application_writes_for_job(client, job_id).await?;
    let removed = writes.len() as u64;
    writes.push(Write::delete_of(
        client.full_document_name(JOBS_COLLECTION, job_id.as_str()),
    ));

    commit_chunked(client, writes).await?;
    info!("Deleted job {} and {} applications", job_id, removed);
    Ok(removed)
}

/// Delete a company together with every job it published and those jobs'
/// applications, releasing the company's reserved name and email.
///
/// Returns the number of jobs removed.
pub async fn delete_company_with_jobs(
    client: &FirestoreClient,
    company: &Company,
) -> FirestoreResult<u64> {
    let mut writes = Vec::new();
    let job_ids = job_ids_for_owner(client, &company.company_hr).await?;
    let removed = job_ids.len() as u64;
    for job_id in &job_ids {
        writes.extend(application_writes_for_job(client, job_id).await?);
        writes.push(Write::delete_of(
            client.full_document_name(JOBS_COLLECTION, job_id.as_str()),
        ));
    }

    writes.push(Write::delete_of(
        client.full_document_name(COMPANIES_COLLECTION, company.id.as_str()),
    ));
    writes.push(release_write(
        client,
        UniqueScope::CompanyName,
        &company.company_name,
    ));
    writes.push(release_write(
        client,
        UniqueScope::CompanyEmail,
        &company.company_email,
    ));

    commit_chunked(client, writes).await?;
    info!("Deleted company {} and {} jobs", company.id, removed);
    Ok(removed)
}

/// Delete a user and everything hanging off the account: an owned company
/// with its jobs and their applications, the user's own applications, and
/// every unique value reservation.
pub async fn delete_user_graph(
    client: &FirestoreClient,
    user: &User,
    owned_company: Option<&Company>,
) -> FirestoreResult<()> {
    let mut writes = Vec::new();

    if let Some(company) = owned_company {
        for job_id in job_ids_for_owner(client, &company.company_hr).await? {
            writes.extend(application_writes_for_job(client, &job_id).await?);
            writes.push(Write::delete_of(
                client.full_document_name(JOBS_COLLECTION, job_id.as_str()),
            ));
        }
        writes.push(Write::delete_of(
            client.full_document_name(COMPANIES_COLLECTION, company.id.as_str()),
        ));
        writes.push(release_write(
            client,
            UniqueScope::CompanyName,
            &company.company_name,
        ));
        writes.push(release_write(
            client,
            UniqueScope::CompanyEmail,
            &company.company_email,
        ));
    }

    // Applications the user submitted elsewhere.
    writes.extend(application_writes_for_user(client, &user.id).await?);

    writes.push(Write::delete_of(
        client.full_document_name(USERS_COLLECTION, user.id.as_str()),
    ));
    writes.push(release_write(client, UniqueScope::UserEmail, &user.email));
    writes.push(release_write(
        client,
        UniqueScope::UserMobile,
        &user.mobile_number,
    ));

    commit_chunked(client, writes).await?;
    info!("Deleted user {} and dependent records", user.id);
    Ok(())
}

// Internal helpers

fn release_write(client: &FirestoreClient, scope: UniqueScope, value: &str) -> Write {
    Write::delete_of(
        client.full_document_name(UNIQUE_KEYS_COLLECTION, &reservation_doc_id(scope, value)),
    )
}

async fn application_writes_for_job(
    client: &FirestoreClient,
    job_id: &JobId,
) -> FirestoreResult<Vec<Write>> {
    let query = StructuredQuery::collection(APPLICATIONS_COLLECTION)
        .where_eq("jobId", job_id.as_str().to_firestore_value());
    delete_writes(client, query).await
}

async fn application_writes_for_user(
    client: &FirestoreClient,
    user_id: &UserId,
) -> FirestoreResult<Vec<Write>> {
    let query = StructuredQuery::collection(APPLICATIONS_COLLECTION)
        .where_eq("userId", user_id.as_str().to_firestore_value());
    delete_writes(client, query).await
}

async fn job_ids_for_owner(
    client: &FirestoreClient,
    hr_id: &UserId,
) -> FirestoreResult<Vec<JobId>> {
    let query = StructuredQuery::collection(JOBS_COLLECTION)
        .where_eq("addedBy", hr_id.as_str().to_firestore_value());

    let docs = client.run_query(query).await?;
    Ok(docs
        .iter()
        .filter_map(|d| d.doc_id())
        .map(JobId::from_string)
        .collect())
}

/// Turn every document matched by `query` into a batch delete.
async fn delete_writes(
    client: &FirestoreClient,
    query: StructuredQuery,
) -> FirestoreResult<Vec<Write>> {
    let docs = client.run_query(query).await?;
    Ok(docs
        .into_iter()
        .filter_map(|d| d.name)
        .map(Write::delete_of)
        .collect())
}

/// Commit writes in order, chunked under the batch limit.
///
/// A deletion graph can reach the same document twice (a user applying to
/// their own company's job); duplicate deletes are dropped before writing.
async fn commit_chunked(client: &FirestoreClient, writes: Vec<Write>) -> FirestoreResult<()> {
    let mut seen = HashSet::new();
    let writes: Vec<Write> = writes
        .into_iter()
        .filter(|w| match &w.delete {
            Some(name) => seen.insert(name.clone()),
            None => true,
        })
        .collect();

    for chunk in writes.chunks(BATCH_WRITE_LIMIT) {
        client.batch_write(chunk.to_vec()).await?;
    }
    Ok(())
}
