// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the SEWAS CLI

pub mod apply;
pub mod config;
pub mod draft;
pub mod update;

pub use self::apply::ApplyCommand;
pub use self::config::ConfigCommand;
pub use self::draft::DraftCommand;
pub use self::update::UpdateCommand;
