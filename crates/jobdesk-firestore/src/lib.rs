//! Firestore-backed persistence for JobDesk.
//!
//! This crate provides:
//! - REST API client with token caching and emulator support
//! - Typed repositories for users, companies, jobs, and applications
//! - Unique value reservations standing in for unique indexes
//! - Cascade deletes built on batch writes
//! - Service account authentication via gcp_auth

pub mod applications;
pub mod cascade;
pub mod client;
pub mod companies;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod token_cache;
pub mod types;
pub mod unique;
pub mod users;

#[cfg(test)]
mod client_tests;

pub use applications::ApplicationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use companies::{CompanyPatch, CompanyRepository};
pub use error::{FirestoreError, FirestoreResult};
pub use jobs::{JobPatch, JobRepository, JobSearch};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
pub use unique::{UniqueKeyRepository, UniqueScope};
pub use users::{ResetOutcome, UserPatch, UserRepository};
