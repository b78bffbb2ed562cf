// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use dispatch_core::collaborators::{Collaborators, InMemoryObjectStorage, JwtAuthProvider, NoopPushNotifier, NullMapProvider};
use dispatch_core::config::Config;
use dispatch_core::transport::state::AppState;
use dispatch_core::transport::{build_health_router, build_router};

fn init_tracing(cfg: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_new(&cfg.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match cfg.log_format.as_str() {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    let Some(jwt_secret) = config.jwt_secret.clone() else {
        error!("fatal: --jwt-secret (or JWT_SECRET) is required");
        std::process::exit(2);
    };

    let collaborators = Collaborators {
        auth: Arc::new(JwtAuthProvider::new(jwt_secret)),
        map: Arc::new(NullMapProvider),
        storage: Arc::new(InMemoryObjectStorage::default()),
        push: Arc::new(NoopPushNotifier),
    };

    let inactivity_sweep = config.inactivity_sweep;
    let inactivity_threshold_secs = config.inactivity_threshold_secs;
    let host = config.host.clone();
    let port = config.port;
    let health_port = config.health_port;

    let state = Arc::new(AppState::new(config, collaborators));

    if inactivity_sweep {
        let state = state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                ticker.tick().await;
                sweep_inactive_drivers(&state, inactivity_threshold_secs);
                state.rate_limiter.sweep();
            }
        });
    } else {
        let state = state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                ticker.tick().await;
                state.rate_limiter.sweep();
            }
        });
    }

    if let Some(health_port) = health_port {
        let health_state = state.clone();
        tokio::spawn(async move {
            let router = build_health_router(health_state);
            let addr = format!("{host}:{health_port}");
            match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => {
                    info!(%addr, "health server listening");
                    if let Err(e) = axum::serve(listener, router).await {
                        error!("health server error: {e:#}");
                    }
                }
                Err(e) => error!("failed to bind health port {addr}: {e:#}"),
            }
        });
    }

    let router = build_router(state.clone());
    let addr = format!("{}:{port}", state.config.host);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {addr}: {e:#}");
            std::process::exit(1);
        }
    };
    info!(%addr, "dispatch-core listening");

    if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

/// Best-effort sweep (REDESIGN FLAGS): flips a driver offline if their
/// `lastSeen` is older than the configured threshold and they hold no
/// active booking, covering clients that vanish without a clean disconnect.
fn sweep_inactive_drivers(state: &Arc<AppState>, threshold_secs: u64) {
    let cutoff = chrono::Utc::now() - chrono::Duration::seconds(threshold_secs as i64);
    for mut user in state.store.users.list() {
        let Some(profile) = user.driver.as_mut() else { continue };
        if !profile.is_online || profile.last_seen > cutoff {
            continue;
        }
        let active = profile
            .current_booking_id
            .as_ref()
            .and_then(|id| state.store.bookings.get(id))
            .map(|b| b.status.is_occupied())
            .unwrap_or(false);
        if active {
            continue;
        }
        profile.is_online = false;
        profile.is_available = false;
        state.store.users.put(&user.user_id, user);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
