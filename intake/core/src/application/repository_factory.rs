// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates the concrete `ApplicationRepository` for the configured storage
//! backend, keeping the domain layer free of infrastructure types.

use std::sync::Arc;

use crate::domain::repository::{ApplicationRepository, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_application::PostgresApplicationRepository;
use crate::infrastructure::repositories::InMemoryApplicationRepository;

/// Creates an ApplicationRepository implementation based on the configured backend.
/// The PostgreSQL backend needs a connected [`Database`].
pub fn create_application_repository(
    backend: &StorageBackend,
    database: Option<&Database>,
) -> anyhow::Result<Arc<dyn ApplicationRepository>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryApplicationRepository::new())),
        StorageBackend::PostgreSQL(_) => {
            let database = database.ok_or_else(|| {
                anyhow::anyhow!("PostgreSQL backend selected but no database connection is available")
            })?;
            Ok(Arc::new(PostgresApplicationRepository::new(database.get_pool().clone())))
        }
    }
}
