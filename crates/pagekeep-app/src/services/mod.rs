// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the command-line front end to the pagekeep
// backend crates.
//
// Each service wraps one or more backend crate APIs in a way that is
// convenient for an interactive caller (async, never blocking the executor,
// returning snapshots the caller can display directly).

pub mod app_services;
pub mod data_dir;
