// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CountMyReps API Server
//!
//! Receives exercise reps by email and serves per-user and per-office
//! report pages.

use anyhow::Context;
use countmyreps::{
    config::{Config, NotifyMode, StoreBackend},
    db::{FirestoreDb, MemoryStore, RepStore},
    services::{DisabledNotifier, Notifier, SendGridNotifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        address = %config.ingest.address,
        kinds = config.ingest.kinds.len(),
        offices = config.offices.len(),
        "Starting CountMyReps API"
    );

    let store: Arc<dyn RepStore> = match config.store_backend {
        StoreBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id)
                .await
                .with_context(|| format!("Failed to connect to Firestore ({})", config.gcp_project_id))?;
            Arc::new(db)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will be lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match config.notify {
        NotifyMode::SendGrid => Arc::new(SendGridNotifier::new(
            config.sendgrid_api_key.clone(),
            config.mail_from.clone(),
        )),
        NotifyMode::Off => {
            tracing::info!("Outbound notifications disabled");
            Arc::new(DisabledNotifier)
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        notifier,
    });

    // Build router
    let app = countmyreps::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("countmyreps=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
