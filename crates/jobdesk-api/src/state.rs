//! Shared application state.

use jobdesk_firestore::{
    ApplicationRepository, CompanyRepository, FirestoreClient, JobRepository, UniqueKeyRepository,
    UserRepository,
};

use crate::config::ApiConfig;
use crate::services::OwnershipService;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    /// Raw client, used directly by the cascade deletes.
    pub firestore: FirestoreClient,
    pub users: UserRepository,
    pub companies: CompanyRepository,
    pub jobs: JobRepository,
    pub applications: ApplicationRepository,
    pub unique_keys: UniqueKeyRepository,
    pub ownership: OwnershipService,
}

impl AppState {
    /// Create application state, connecting to Firestore with credentials
    /// from the environment.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let firestore = FirestoreClient::from_env().await?;
        Ok(Self::with_firestore(config, firestore))
    }

    /// Create application state over an already-built Firestore client.
    /// Integration tests inject an emulator-backed client here.
    pub fn with_firestore(config: ApiConfig, firestore: FirestoreClient) -> Self {
        let companies = CompanyRepository::new(firestore.clone());
        Self {
            config,
            users: UserRepository::new(firestore.clone()),
            jobs: JobRepository::new(firestore.clone()),
            applications: ApplicationRepository::new(firestore.clone()),
            unique_keys: UniqueKeyRepository::new(firestore.clone()),
            ownership: OwnershipService::new(companies.clone()),
            companies,
            firestore,
        }
    }
}
