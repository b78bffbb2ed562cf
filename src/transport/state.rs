// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state passed to all handlers via axum's `State`
//! extractor, following the teacher's sub-struct-by-concern layout
//! (`terminal`/`driver`/`channels`/`config`/`lifecycle`) generalized to this
//! domain's collaborators and runtime primitives.

use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::{AuthProvider, MapProvider, ObjectStorage, PushNotifier};
use crate::config::Config;
use crate::domain::dispatch::DispatchConfig;
use crate::domain::fare::FareRates;
use crate::domain::lock::BookingLockService;
use crate::domain::service_area::ServiceAreaConfig;
use crate::domain::slots::SlotGenerationGuard;
use crate::rate_limit::RateLimiter;
use crate::store::memory::Store;
use crate::transport::rooms::Rooms;

/// Collaborator trait objects injected at boot (spec §6). Grouped so
/// `AppState` doesn't carry four separate `Arc<dyn ...>` fields.
pub struct Collaborators {
    pub auth: Arc<dyn AuthProvider>,
    pub map: Arc<dyn MapProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub push: Arc<dyn PushNotifier>,
}

pub struct AppState {
    pub store: Store,
    pub rooms: Rooms,
    pub locks: BookingLockService,
    pub slot_guard: SlotGenerationGuard,
    pub rate_limiter: RateLimiter,
    pub collaborators: Collaborators,

    pub service_area: ServiceAreaConfig,
    pub fare_rates: FareRates,
    pub dispatch: DispatchConfig,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let fare_rates = FareRates { base_fare: config.fare_base, per_km_rate: config.fare_per_km };
        let dispatch = DispatchConfig {
            radius_min_km: config.radius_min_km,
            radius_max_km: config.radius_max_km,
            radius_step_km: config.radius_step_km,
        };
        let service_area = ServiceAreaConfig {
            centre: crate::domain::geo::Point::new(config.service_area_center_lat, config.service_area_center_lng),
            radius_min_m: config.service_area_radius_min_m,
            radius_max_m: config.service_area_radius_max_m,
            warning_threshold_m: config.service_area_warning_threshold_m,
            strict: config.service_area_strict,
        };
        Self {
            store: Store::new(),
            rooms: Rooms::new(),
            locks: BookingLockService::new(Duration::from_secs(config.lock_ttl_secs)),
            slot_guard: SlotGenerationGuard::new(),
            rate_limiter: RateLimiter::new(),
            collaborators,
            service_area,
            fare_rates,
            dispatch,
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("port", &self.config.port).finish()
    }
}
