// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

/// SEWAS Intake Rust SDK
///
/// HTTP client for the intake API: create applications, request document
/// upload URLs, transfer documents and attach them to an application.

pub mod client;

pub use client::{ClientError, IntakeClient};
