// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: builders, fakes, and a token-minting helper.

use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header};

use crate::collaborators::{
    Claims, Collaborators, InMemoryObjectStorage, JwtAuthProvider, MapProvider, NoopPushNotifier, NullMapProvider,
};
use crate::config::Config;
use crate::domain::geo::Point;
use crate::domain::user::{AdminRole, UserType};
use crate::error::ErrorCode;
use crate::transport::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-do-not-use-in-production";

/// Builder for constructing an [`AppState`] in tests with sensible defaults,
/// mirroring the teacher's own `StoreBuilder` pattern.
pub struct AppStateBuilder {
    config: Config,
    map: Option<Arc<dyn MapProvider>>,
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self { config: default_test_config(), map: None }
    }

    pub fn config(mut self, f: impl FnOnce(Config) -> Config) -> Self {
        self.config = f(self.config);
        self
    }

    pub fn map_provider(mut self, map: Arc<dyn MapProvider>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn build(self) -> Arc<AppState> {
        let collaborators = Collaborators {
            auth: Arc::new(JwtAuthProvider::new(TEST_JWT_SECRET)),
            map: self.map.unwrap_or_else(|| Arc::new(NullMapProvider)),
            storage: Arc::new(InMemoryObjectStorage::default()),
            push: Arc::new(NoopPushNotifier),
        };
        Arc::new(AppState::new(self.config, collaborators))
    }
}

fn default_test_config() -> Config {
    Config {
        port: 0,
        host: "127.0.0.1".to_owned(),
        health_port: None,
        jwt_secret: Some(TEST_JWT_SECRET.to_owned()),
        log_format: "text".to_owned(),
        log_level: "info".to_owned(),
        radius_min_km: 2.0,
        radius_max_km: 8.0,
        radius_step_km: 2.0,
        offer_timeout_secs: 15,
        lock_ttl_secs: 10,
        fare_base: 3000,
        fare_per_km: 1200,
        slots_per_day: 8,
        slot_duration_hours: 2,
        bcrypt_salt_rounds: 10,
        inactivity_sweep: false,
        inactivity_threshold_secs: 120,
        ws_max_missed_pongs: 3,
        ws_heartbeat_secs: 20,
        service_area_center_lat: 12.9716,
        service_area_center_lng: 77.5946,
        service_area_radius_min_m: 0.0,
        service_area_radius_max_m: 30_000.0,
        service_area_warning_threshold_m: 27_000.0,
        service_area_strict: true,
        max_package_weight_kg: 20.0,
        max_distance_km: 25.0,
        min_booking_amount: 2000,
    }
}

/// Mint a bearer token for the given identity, signed with the same secret
/// the test `AppState` verifies against.
pub fn mint_token(user_id: &str, user_type: UserType, role: Option<AdminRole>) -> String {
    let claims = Claims {
        user_id: user_id.to_owned(),
        user_type,
        role,
        phone: "+910000000000".to_owned(),
        exp: 9_999_999_999,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("encode test token")
}

/// A `MapProvider` stub returning a fixed distance, for dispatch/fare tests
/// that need a deterministic map-distance instead of Haversine fallback.
pub struct FixedDistanceMapProvider(pub f64);

impl MapProvider for FixedDistanceMapProvider {
    fn distance_km(&self, _origin: Point, _dest: Point) -> Result<f64, ErrorCode> {
        Ok(self.0)
    }
}

/// Spawn an HTTP server on a random port for integration testing.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(state: Arc<AppState>) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}
