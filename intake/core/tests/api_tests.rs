// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use sewas_intake_core::application::{SubmissionService, UploadService};
use sewas_intake_core::domain::object_store::MAX_UPLOAD_URL_TTL;
use sewas_intake_core::infrastructure::object_store::MockUploadSigner;
use sewas_intake_core::infrastructure::repositories::InMemoryApplicationRepository;
use sewas_intake_core::presentation::{app, AppState};

struct Harness {
    router: Router,
    repository: Arc<InMemoryApplicationRepository>,
    signer: Arc<MockUploadSigner>,
}

fn harness_with_signer(signer: Arc<MockUploadSigner>) -> Harness {
    let repository = Arc::new(InMemoryApplicationRepository::new());
    let submissions = Arc::new(SubmissionService::new(repository.clone()));
    let uploads = Arc::new(UploadService::new(signer.clone(), MAX_UPLOAD_URL_TTL));
    Harness {
        router: app(AppState::new(submissions, uploads)),
        repository,
        signer,
    }
}

fn harness() -> Harness {
    harness_with_signer(Arc::new(MockUploadSigner::new("https://uploads.test")))
}

fn valid_application() -> Value {
    json!({
        "fullName": "Asha Verma",
        "fatherName": "Ramesh Verma",
        "dateOfBirth": "1990-04-12",
        "gender": "female",
        "mobileNumber": "9876543210",
        "emailAddress": "asha@example.in",
        "permanentAddress": "12 Station Road, Indore",
        "currentAddress": "",
        "occupation": "Teacher",
        "monthlyIncome": "25000-50000",
        "housingPreference": "3bhk",
        "preferredCity": "Indore — Madhya Pradesh",
        "documents": {},
        "legalAcknowledgment": true,
        "termsAgreement": true,
        "marketingConsent": false
    })
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_uptime() {
    let h = harness();
    let (status, body) = send(&h.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_create_application_returns_id_and_created_at() {
    let h = harness();
    let (status, body) = send(&h.router, Method::POST, "/api/inquiry", Some(valid_application())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert!(body["createdAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(h.repository.len(), 1);
}

#[tokio::test]
async fn test_create_application_reports_field_errors() {
    let h = harness();
    let mut payload = valid_application();
    payload["mobileNumber"] = json!("12345");
    payload["termsAgreement"] = json!(false);

    let (status, body) = send(&h.router, Method::POST, "/api/inquiry", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"]["mobileNumber"], "Invalid mobile number");
    assert!(body["errors"]["termsAgreement"].is_string());
    assert!(h.repository.is_empty());
}

#[tokio::test]
async fn test_create_application_rejects_malformed_json() {
    let h = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/inquiry")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"fullName\": "))
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_patch_documents_then_read_back() {
    let h = harness();
    let (_, created) = send(&h.router, Method::POST, "/api/inquiry", Some(valid_application())).await;
    let id = created["id"].as_str().unwrap();
    let created_at = created["createdAt"].as_str().unwrap();

    let (status, body) = send(
        &h.router,
        Method::PUT,
        &format!("/api/inquiry/{}", id),
        Some(json!({
            "createdAt": created_at,
            "documents": {
                "aadhar": "documents/u1/1736930000000-1a2b3c4d.pdf",
                "photo": "documents/u1/1736930000001-5e6f7a8b.jpg",
                "panCard": ""
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = send(
        &h.router,
        Method::GET,
        &format!("/api/inquiry/{}?createdAt={}", id, created_at),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let documents = body["application"]["documents"].as_object().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(body["application"]["fullName"], "Asha Verma");
    assert_eq!(body["application"]["createdAt"], created_at);
}

#[tokio::test]
async fn test_patch_without_created_at_is_rejected_and_changes_nothing() {
    let h = harness();
    let (_, created) = send(&h.router, Method::POST, "/api/inquiry", Some(valid_application())).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &h.router,
        Method::PUT,
        &format!("/api/inquiry/{}", id),
        Some(json!({ "documents": { "aadhar": "documents/u1/1-abcd1234.pdf" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "createdAt is required for document update");

    let (_, body) = send(
        &h.router,
        Method::GET,
        &format!("/api/inquiry/{}?createdAt={}", id, created["createdAt"].as_str().unwrap()),
        None,
    )
    .await;
    assert!(body["application"]["documents"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_patch_with_wrong_sort_key_is_not_found() {
    let h = harness();
    let (_, created) = send(&h.router, Method::POST, "/api/inquiry", Some(valid_application())).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &h.router,
        Method::PUT,
        &format!("/api/inquiry/{}", id),
        Some(json!({ "createdAt": "2020-01-01T00:00:00.000Z", "documents": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_patch_rejects_unknown_slot() {
    let h = harness();
    let (_, created) = send(&h.router, Method::POST, "/api/inquiry", Some(valid_application())).await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &h.router,
        Method::PUT,
        &format!("/api/inquiry/{}", id),
        Some(json!({ "createdAt": created["createdAt"], "documents": { "passport": "x" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lookup_requires_created_at() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        Method::GET,
        &format!("/api/inquiry/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "createdAt is required for application lookup");
}

#[tokio::test]
async fn test_upload_url_issued_for_allowed_type() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/upload",
        Some(json!({ "fileName": "Aadhar Scan.PDF", "fileType": "application/pdf", "userId": "u1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["expiresIn"], 3600);
    let key = body["key"].as_str().unwrap();
    let shape = regex::Regex::new(r"^documents/u1/[0-9]+-[0-9a-f]{8}\.pdf$").unwrap();
    assert!(shape.is_match(key), "unexpected key {}", key);
    assert!(body["uploadUrl"].as_str().unwrap().contains(key));
    assert_eq!(body["headers"]["content-type"], "application/pdf");

    let requests = h.signer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type, "application/pdf");
}

#[tokio::test]
async fn test_upload_url_rejects_missing_fields_and_bad_type() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/upload",
        Some(json!({ "fileName": "a.pdf", "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");

    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/upload",
        Some(json!({ "fileName": "a.gif", "fileType": "image/gif", "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File type not allowed");
    assert!(h.signer.requests().is_empty());
}

#[tokio::test]
async fn test_upload_url_rejects_declared_oversize() {
    let h = harness();
    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/upload",
        Some(json!({
            "fileName": "a.pdf",
            "fileType": "application/pdf",
            "userId": "u1",
            "contentLength": 6 * 1024 * 1024
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File too large");
}

#[tokio::test]
async fn test_upload_url_signer_failure_is_a_server_error() {
    let h = harness_with_signer(Arc::new(MockUploadSigner::failing("connection refused")));
    let (status, body) = send(
        &h.router,
        Method::POST,
        "/api/upload",
        Some(json!({ "fileName": "a.png", "fileType": "image/png", "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to generate upload URL");
}
