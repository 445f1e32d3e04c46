// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Intake HTTP server bootstrap
//!
//! Builds every shared handle once from a validated [`IntakeConfigManifest`]
//! and serves the core router until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use sewas_intake_core::application::repository_factory::create_application_repository;
use sewas_intake_core::application::{SubmissionService, UploadService};
use sewas_intake_core::domain::intake_config::{IntakeConfigManifest, ServerConfig};
use sewas_intake_core::domain::repository::StorageBackend;
use sewas_intake_core::infrastructure::db::Database;
use sewas_intake_core::infrastructure::object_store::create_upload_signer;
use sewas_intake_core::presentation::{app, AppState};

/// Wires repository, signer and services from configuration.
pub async fn build_state(config: &IntakeConfigManifest) -> Result<AppState> {
    let backend = config.storage_backend()?;
    let database = match &backend {
        StorageBackend::PostgreSQL(pg) => {
            info!("Connecting to PostgreSQL (max_connections={})", pg.max_connections);
            Some(Database::from_config(pg).await?)
        }
        StorageBackend::InMemory => {
            warn!("Using in-memory application repository; records are lost on restart");
            None
        }
    };
    let repository = create_application_repository(&backend, database.as_ref())?;

    let store_config = &config.spec.object_store;
    let signer = create_upload_signer(store_config).context("Failed to initialize object store signer")?;

    let submissions = Arc::new(SubmissionService::new(repository));
    let uploads = Arc::new(UploadService::new(signer, store_config.upload_url_ttl()));

    Ok(AppState::new(submissions, uploads))
}

/// Adds CORS and request tracing to the core router.
pub fn with_layers(router: Router, server: &ServerConfig) -> Router {
    let router = router.layer(TraceLayer::new_for_http());
    if server.cors_allowed_origins.is_empty() {
        return router;
    }

    let origins: Vec<HeaderValue> = server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring unparseable CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    router.layer(cors)
}

pub async fn start_server(config: IntakeConfigManifest) -> Result<()> {
    config.validate().context("Configuration validation failed")?;
    info!("Configuration loaded: name={}", config.metadata.name);

    if let Some(metrics) = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.as_ref())
        .filter(|m| m.enabled)
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics.port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to start Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    }

    let state = build_state(&config).await?;
    let router = with_layers(app(state), &config.spec.server);

    let addr = format!("{}:{}", config.spec.server.bind_address, config.spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Intake API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Intake API shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sewas_intake_core::domain::intake_config::ObjectStoreKind;
    use tower::ServiceExt;

    fn local_config() -> IntakeConfigManifest {
        let mut config = IntakeConfigManifest::default();
        config.spec.object_store.backend = ObjectStoreKind::Mock;
        config
    }

    #[tokio::test]
    async fn test_build_state_with_local_backends() {
        let state = build_state(&local_config()).await.unwrap();
        assert_eq!(state.uploads.expires_in(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let mut config = local_config();
        config.spec.server.cors_allowed_origins = vec!["https://sewas.city".to_string()];
        let router = with_layers(app(build_state(&config).await.unwrap()), &config.spec.server);

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/inquiry")
            .header("Origin", "https://sewas.city")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://sewas.city"
        );
    }
}
