//! Tests for Firestore client functionality.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chrono::NaiveDate;

use jobdesk_models::{Company, JobId, User, UserId, UserRole};

use crate::cascade;
use crate::client::{FirestoreClient, FirestoreConfig};
use crate::error::FirestoreError;
use crate::types::{FromFirestoreValue, ToFirestoreValue, Write};
use crate::users::UserRepository;

// =============================================================================
// Test Helpers
// =============================================================================

const DOCUMENTS_PATH: &str = "/v1/projects/demo-jobdesk/databases/(default)/documents";

async fn emulator_client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(FirestoreConfig::emulator("demo-jobdesk", server.uri()))
        .await
        .unwrap()
}

fn doc_json(name: &str, fields: serde_json::Value) -> serde_json::Value {
    json!({
        "name": name,
        "fields": fields,
        "createTime": "2024-05-01T10:00:00Z",
        "updateTime": "2024-05-01T10:00:00Z"
    })
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_401() {
    let err = FirestoreError::from_http_status(401, "token rejected");
    assert!(matches!(err, FirestoreError::AuthError(_)));
    assert_eq!(err.http_status(), Some(401));
}

#[test]
fn test_error_from_http_status_403() {
    let err = FirestoreError::from_http_status(403, "missing datastore permission");
    assert!(matches!(err, FirestoreError::PermissionDenied(_)));
    assert_eq!(err.http_status(), Some(403));
}

#[test]
fn test_error_from_http_status_429() {
    let err = FirestoreError::from_http_status(429, "quota exceeded");
    assert!(matches!(err, FirestoreError::RateLimited(_)));
    assert_eq!(err.http_status(), Some(429));
}

#[test]
fn test_error_from_http_status_400() {
    let err = FirestoreError::from_http_status(400, "bad request");
    assert!(matches!(err, FirestoreError::RequestFailed(_)));
    assert_eq!(err.http_status(), Some(500));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_accepts_firebase_project_id() {
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "firebase-project");
    std::env::remove_var("FIREBASE_PROJECT_ID");
}

#[test]
#[serial]
fn test_config_prefers_gcp_project_id() {
    std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    std::env::set_var("GCP_PROJECT_ID", "gcp-project");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "gcp-project");
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::remove_var("FIREBASE_PROJECT_ID");
}

#[test]
#[serial]
fn test_config_handles_invalid_env_values() {
    std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_CONNECT_TIMEOUT_SECS", "not-a-number");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::remove_var("FIRESTORE_CONNECT_TIMEOUT_SECS");
}

#[test]
#[serial]
fn test_config_reads_database_id() {
    std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_DATABASE_ID", "jobs-db");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.database_id, "jobs-db");
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::remove_var("FIRESTORE_DATABASE_ID");
}

// =============================================================================
// Request Tests
// =============================================================================

#[tokio::test]
async fn test_get_document_parses_response() {
    let server = MockServer::start().await;
    let name = "projects/demo-jobdesk/databases/(default)/documents/users/u-1";
    Mock::given(method("GET"))
        .and(path(format!("{}/users/u-1", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc_json(
            name,
            json!({"email": {"stringValue": "amira@jobdesk.io"}}),
        )))
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let doc = client
        .get_document("users", "u-1")
        .await
        .unwrap()
        .expect("document should be found");

    assert_eq!(doc.doc_id(), Some("u-1"));
    let email = doc
        .fields
        .as_ref()
        .and_then(|f| f.get("email"))
        .and_then(String::from_firestore_value);
    assert_eq!(email.as_deref(), Some("amira@jobdesk.io"));
}

#[tokio::test]
async fn test_get_document_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/users/ghost", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "status": "NOT_FOUND", "message": "missing"}
        })))
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let doc = client.get_document("users", "ghost").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn test_create_document_conflict_is_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/unique_keys", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "status": "ALREADY_EXISTS", "message": "taken"}
        })))
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let mut fields = HashMap::new();
    fields.insert("ownerId".to_string(), "u-1".to_firestore_value());

    let err = client
        .create_document("unique_keys", "user_email:taken", fields)
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_delete_document_missing_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/unique_keys/user_email:gone", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    client
        .delete_document("unique_keys", "user_email:gone")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_precondition_conflict_maps_to_precondition_failed() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/users/u-1", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "status": "FAILED_PRECONDITION", "message": "stale update time"}
        })))
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let mut fields = HashMap::new();
    fields.insert("password".to_string(), "$2b$10$new".to_firestore_value());

    let err = client
        .update_document_with_precondition(
            "users",
            "u-1",
            fields,
            Some(vec!["password".to_string(), "otp".to_string()]),
            Some("2024-05-01T10:00:00.000001Z"),
        )
        .await
        .unwrap_err();
    assert!(err.is_precondition_failed());
}

// =============================================================================
// Token Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_expired_token_resends_once() {
    let server = MockServer::start().await;
    let doc_path = format!("{}/jobs/j-1", DOCUMENTS_PATH);

    // First attempt is rejected as expired; the resend must succeed.
    Mock::given(method("GET"))
        .and(path(doc_path.clone()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "code": 401,
                "status": "UNAUTHENTICATED",
                "message": "ACCESS_TOKEN_EXPIRED"
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(doc_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc_json(
            "projects/demo-jobdesk/databases/(default)/documents/jobs/j-1",
            json!({"jobTitle": {"stringValue": "Backend Engineer"}}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let doc = client.get_document("jobs", "j-1").await.unwrap();
    assert!(doc.is_some());
}

#[tokio::test]
async fn test_unauthorized_without_expiry_marker_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/jobs/j-1", DOCUMENTS_PATH)))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error": {"message": "key revoked"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let err = client.get_document("jobs", "j-1").await.unwrap_err();
    assert!(matches!(err, FirestoreError::AuthError(_)));
}

// =============================================================================
// Query and Batch Tests
// =============================================================================

#[tokio::test]
async fn test_find_by_email_parses_user() {
    let server = MockServer::start().await;
    let name = "projects/demo-jobdesk/databases/(default)/documents/users/u-7";
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS_PATH)))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "users"}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "email"},
                    "op": "EQUAL",
                    "value": {"stringValue": "amira@jobdesk.io"}
                }},
                "limit": 1
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": doc_json(name, json!({
                    "firstName": {"stringValue": "Amira"},
                    "email": {"stringValue": "amira@jobdesk.io"},
                    "role": {"stringValue": "Company_HR"},
                    "status": {"stringValue": "offline"}
                })),
                "readTime": "2024-05-01T10:00:01Z"
            },
            {"readTime": "2024-05-01T10:00:01Z"}
        ])))
        .mount(&server)
        .await;

    let repo = UserRepository::new(emulator_client(&server).await);
    let user = repo
        .find_by_email("amira@jobdesk.io")
        .await
        .unwrap()
        .expect("user should be found");

    assert_eq!(user.id.as_str(), "u-7");
    assert_eq!(user.first_name, "Amira");
    assert_eq!(user.role, UserRole::CompanyHr);
}

#[tokio::test]
async fn test_batch_write_surfaces_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:batchWrite", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}, {}],
            "status": [
                {"code": 0},
                {"code": 5, "message": "no such document"}
            ]
        })))
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let writes = vec![
        Write::delete_of(client.full_document_name("applications", "a-1")),
        Write::delete_of(client.full_document_name("applications", "a-2")),
    ];

    let err = client.batch_write(writes).await.unwrap_err();
    assert!(matches!(err, FirestoreError::RequestFailed(_)));
}

#[tokio::test]
async fn test_delete_job_with_applications_batches_deletes() {
    let server = MockServer::start().await;

    // The cascade first queries applications for the job.
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS_PATH)))
        .and(body_partial_json(json!({
            "structuredQuery": {"from": [{"collectionId": "applications"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": doc_json(
                "projects/demo-jobdesk/databases/(default)/documents/applications/a-1",
                json!({"jobId": {"stringValue": "j-1"}})
            )},
            {"document": doc_json(
                "projects/demo-jobdesk/databases/(default)/documents/applications/a-2",
                json!({"jobId": {"stringValue": "j-1"}})
            )}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Then removes both applications and the job itself in one batch.
    Mock::given(method("POST"))
        .and(path(format!("{}:batchWrite", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}, {}, {}],
            "status": [{"code": 0}, {"code": 0}, {"code": 0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = emulator_client(&server).await;
    let removed = cascade::delete_job_with_applications(&client, &JobId::from_string("j-1"))
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn test_delete_company_cascades_jobs_and_applications() {
    let server = MockServer::start().await;

    // The company's jobs are looked up by their HR owner.
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS_PATH)))
        .and(body_partial_json(json!({
            "structuredQuery": {"from": [{"collectionId": "jobs"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": doc_json(
                "projects/demo-jobdesk/databases/(default)/documents/jobs/j-1",
                json!({"addedBy": {"stringValue": "hr-1"}})
            )},
            {"document": doc_json(
                "projects/demo-jobdesk/databases/(default)/documents/jobs/j-2",
                json!({"addedBy": {"stringValue": "hr-1"}})
            )}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // One job has an application, the other has none.
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS_PATH)))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "applications"}],
                "where": {"fieldFilter": {"value": {"stringValue": "j-1"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": doc_json(
                "projects/demo-jobdesk/databases/(default)/documents/applications/a-1",
                json!({"jobId": {"stringValue": "j-1"}})
            )}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS_PATH)))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "applications"}],
                "where": {"fieldFilter": {"value": {"stringValue": "j-2"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"readTime": "2024-05-01T10:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Application, both jobs, the company doc, and its two unique-key
    // reservations all land in a single batch.
    Mock::given(method("POST"))
        .and(path(format!("{}:batchWrite", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}, {}, {}, {}, {}, {}],
            "status": [
                {"code": 0}, {"code": 0}, {"code": 0},
                {"code": 0}, {"code": 0}, {"code": 0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let company = Company::new(
        "Acme Robotics",
        "Industrial automation",
        "Manufacturing",
        "Berlin",
        "11-20 employees",
        "ops@acme-robotics.test",
        UserId::from_string("hr-1"),
    );

    let client = emulator_client(&server).await;
    let removed = cascade::delete_company_with_jobs(&client, &company)
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn test_delete_user_graph_removes_applications_and_keys() {
    let server = MockServer::start().await;

    // The user's own submitted applications are collected first.
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCUMENTS_PATH)))
        .and(body_partial_json(json!({
            "structuredQuery": {"from": [{"collectionId": "applications"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": doc_json(
                "projects/demo-jobdesk/databases/(default)/documents/applications/a-9",
                json!({"userId": {"stringValue": "u-1"}})
            )}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Application, user document, and both unique-key reservations go in
    // one batch.
    Mock::given(method("POST"))
        .and(path(format!("{}:batchWrite", DOCUMENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}, {}, {}, {}],
            "status": [{"code": 0}, {"code": 0}, {"code": 0}, {"code": 0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut user = User::new(
        "Amira",
        "Khaled",
        "amira.k",
        "amira@jobdesk.io",
        "$2b$10$digestdigestdigestdigestdigest",
        "backup@jobdesk.io",
        NaiveDate::from_ymd_opt(1994, 6, 12).unwrap(),
        "+201001234567",
        UserRole::User,
    );
    user.id = UserId::from_string("u-1");

    let client = emulator_client(&server).await;
    cascade::delete_user_graph(&client, &user, None).await.unwrap();
}
