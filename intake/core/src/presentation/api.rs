// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Intake HTTP API
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /api/inquiry` | create an application |
//! | `PUT /api/inquiry/{id}` | replace its document references (`createdAt` required) |
//! | `GET /api/inquiry/{id}?createdAt=` | read it back |
//! | `POST /api/upload` | issue a pre-signed document upload URL |
//! | `GET /health` | liveness + uptime |
//!
//! Handlers are stateless; everything they share lives in [`AppState`],
//! built once at startup.

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::application::submission_service::SubmissionService;
use crate::application::upload_service::{UploadService, UploadUrlRequest};
use crate::domain::application::ApplicationSubmission;
use crate::presentation::error::ApiError;

pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub uploads: Arc<UploadService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(submissions: Arc<SubmissionService>, uploads: Arc<UploadService>) -> Self {
        Self {
            submissions,
            uploads,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/inquiry", post(create_application_handler))
        .route(
            "/api/inquiry/{id}",
            get(get_application_handler).put(patch_documents_handler),
        )
        .route("/api/upload", post(upload_url_handler))
        .with_state(Arc::new(state))
}

/// `PUT /api/inquiry/{id}` body. Loosely typed on purpose: a missing or
/// non-string `createdAt` is a 400 with a specific message, and `documents`
/// entries that are not strings are dropped rather than rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchDocumentsRequest {
    pub documents: Option<Value>,
    pub created_at: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationLookup {
    pub created_at: Option<String>,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn create_application_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApplicationSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(submission) = payload?;
    let created = state.submissions.create(submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": created.id,
            "createdAt": created.created_at,
        })),
    ))
}

async fn patch_documents_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<PatchDocumentsRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    let created_at = request.created_at.as_ref().and_then(Value::as_str);
    let documents = match request.documents {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    state
        .submissions
        .patch_documents(&id, created_at, &documents)
        .await?;

    Ok(Json(json!({ "success": true })))
}

async fn get_application_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    lookup: Result<Query<ApplicationLookup>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(lookup) = lookup?;
    let application = state
        .submissions
        .get(&id, lookup.created_at.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "application": application,
    })))
}

async fn upload_url_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let declared_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    let issued = state.uploads.issue(&request, declared_length).await?;

    Ok(Json(json!({
        "uploadUrl": issued.upload_url,
        "key": issued.key,
        "success": true,
        "expiresIn": issued.expires_in,
        "headers": issued.headers,
    })))
}
