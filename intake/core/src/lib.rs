// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! SEWAS Intake Core
//!
//! Applicant intake for the SEWAS City affordable-housing scheme: the
//! multi-step form model, its validation rules, draft checkpoints, document
//! upload URL issuance and application persistence.
//!
//! # Architecture
//!
//! - **domain:** form vocabulary, validation, records and the repository/signer contracts
//! - **application:** step controller, submission and upload services
//! - **infrastructure:** PostgreSQL, object store and draft file adapters
//! - **presentation:** HTTP routes under `/api`

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
