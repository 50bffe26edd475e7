// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CountMyReps: tally exercise reps submitted by email.
//!
//! This crate provides the backend that receives SendGrid Inbound Parse
//! webhooks, records the rep counts found in the subject line, and renders
//! per-user and per-office reports.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::RepStore;
use services::Notifier;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RepStore>,
    pub notifier: Arc<dyn Notifier>,
}
