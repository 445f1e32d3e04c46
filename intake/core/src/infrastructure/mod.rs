// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod draft_store;
pub mod object_store;
pub mod repositories;
