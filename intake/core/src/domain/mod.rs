// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod application;
pub mod draft;
pub mod intake_config;
pub mod object_store;
pub mod record;
pub mod repository;
pub mod step;
pub mod validation;
