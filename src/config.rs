// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

/// Delivery dispatch core: booking state machine, real-time session plane,
/// and driver scheduling for an on-demand parcel delivery platform.
#[derive(Debug, Parser)]
#[command(name = "dispatch-core", version, about)]
pub struct Config {
    /// HTTP port to listen on.
    #[arg(long, env = "DISPATCH_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "DISPATCH_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Health-check-only HTTP port.
    #[arg(long, env = "DISPATCH_HEALTH_PORT")]
    pub health_port: Option<u16>,

    /// Secret used to verify HS256 JWTs presented as bearer tokens.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Log format (json or text).
    #[arg(long, env = "DISPATCH_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "DISPATCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Dispatch candidate search radius, minimum kilometers.
    #[arg(long, env = "DISPATCH_RADIUS_MIN_KM", default_value = "1.0")]
    pub radius_min_km: f64,

    /// Dispatch candidate search radius, maximum kilometers.
    #[arg(long, env = "DISPATCH_RADIUS_MAX_KM", default_value = "15.0")]
    pub radius_max_km: f64,

    /// Radius step used when widening the search after an empty round.
    #[arg(long, env = "DISPATCH_RADIUS_STEP_KM", default_value = "2.0")]
    pub radius_step_km: f64,

    /// How long a driver has to respond to an offer before it expires, seconds.
    #[arg(long, env = "DISPATCH_OFFER_TIMEOUT_SECS", default_value = "15")]
    pub offer_timeout_secs: u64,

    /// Advisory booking-lock TTL, seconds.
    #[arg(long, env = "DISPATCH_LOCK_TTL_SECS", default_value = "10")]
    pub lock_ttl_secs: u64,

    /// Base fare in minor currency units (e.g. cents).
    #[arg(long, env = "FARE_BASE", default_value = "5000")]
    pub fare_base: i64,

    /// Per-kilometer rate in minor currency units.
    #[arg(long, env = "FARE_PER_KM", default_value = "1200")]
    pub fare_per_km: i64,

    /// Number of fixed daily work slots generated per driver.
    #[arg(long, env = "SLOTS_PER_DAY", default_value = "8")]
    pub slots_per_day: u32,

    /// Duration of a single work slot, hours.
    #[arg(long, env = "SLOT_DURATION_HOURS", default_value = "2")]
    pub slot_duration_hours: u32,

    /// bcrypt cost factor recognized for deployments that front this service
    /// with a password-based auth provider. Not exercised by the core itself.
    #[arg(long, env = "BCRYPT_SALT_ROUNDS", default_value = "12")]
    pub bcrypt_salt_rounds: u32,

    /// Enable the best-effort inactivity sweep that flips stale drivers offline.
    #[arg(long, env = "DISPATCH_INACTIVITY_SWEEP", default_value = "false")]
    pub inactivity_sweep: bool,

    /// Inactivity threshold before the sweep marks a driver offline, seconds.
    #[arg(long, env = "DISPATCH_INACTIVITY_THRESHOLD_SECS", default_value = "300")]
    pub inactivity_threshold_secs: u64,

    /// WebSocket idle timeout: missed consecutive pongs before disconnect.
    #[arg(long, env = "DISPATCH_WS_MAX_MISSED_PONGS", default_value = "2")]
    pub ws_max_missed_pongs: u32,

    /// WebSocket heartbeat interval, seconds.
    #[arg(long, env = "DISPATCH_WS_HEARTBEAT_SECS", default_value = "15")]
    pub ws_heartbeat_secs: u64,

    /// Service area centre latitude.
    #[arg(long, env = "SERVICE_AREA_CENTER_LAT", default_value = "12.9716")]
    pub service_area_center_lat: f64,

    /// Service area centre longitude.
    #[arg(long, env = "SERVICE_AREA_CENTER_LNG", default_value = "77.5946")]
    pub service_area_center_lng: f64,

    /// Minimum distance from the centre point a pickup/dropoff may sit at, metres.
    #[arg(long, env = "SERVICE_AREA_RADIUS_MIN", default_value = "0")]
    pub service_area_radius_min_m: f64,

    /// Maximum distance from the centre point a pickup/dropoff may sit at, metres.
    #[arg(long, env = "SERVICE_AREA_RADIUS_MAX", default_value = "25000")]
    pub service_area_radius_max_m: f64,

    /// Distance beyond which a valid point is flagged with a warning, metres.
    #[arg(long, env = "SERVICE_AREA_WARNING_THRESHOLD", default_value = "20000")]
    pub service_area_warning_threshold_m: f64,

    /// Refuse to flip a driver online outside the service area.
    #[arg(long, env = "SERVICE_AREA_STRICT", default_value = "true")]
    pub service_area_strict: bool,

    /// Maximum package weight the Fare Engine and booking validation accept, kilograms.
    #[arg(long, env = "MAX_PACKAGE_WEIGHT_KG", default_value = "50")]
    pub max_package_weight_kg: f64,

    /// Maximum trip distance accepted at booking creation, kilometers.
    #[arg(long, env = "MAX_DISTANCE_KM", default_value = "100")]
    pub max_distance_km: f64,

    /// Minimum total fare accepted at booking creation, minor currency units.
    #[arg(long, env = "MIN_BOOKING_AMOUNT_INR", default_value = "50")]
    pub min_booking_amount: i64,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.radius_min_km <= 0.0 {
            anyhow::bail!("--radius-min-km must be positive");
        }
        if self.radius_max_km < self.radius_min_km {
            anyhow::bail!("--radius-max-km must be >= --radius-min-km");
        }
        if self.radius_step_km <= 0.0 {
            anyhow::bail!("--radius-step-km must be positive");
        }
        if self.offer_timeout_secs == 0 {
            anyhow::bail!("--offer-timeout-secs must be positive");
        }
        if self.slots_per_day == 0 {
            anyhow::bail!("--slots-per-day must be positive");
        }
        if self.slot_duration_hours == 0 || self.slot_duration_hours * self.slots_per_day > 24 {
            anyhow::bail!("slot schedule must fit within a 24-hour day");
        }
        if !(4..=31).contains(&self.bcrypt_salt_rounds) {
            anyhow::bail!("--bcrypt-salt-rounds out of range");
        }
        if self.ws_max_missed_pongs == 0 {
            anyhow::bail!("--ws-max-missed-pongs must be positive");
        }
        if self.service_area_radius_max_m < self.service_area_radius_min_m {
            anyhow::bail!("--service-area-radius-max must be >= --service-area-radius-min");
        }
        if self.max_package_weight_kg <= 0.0 {
            anyhow::bail!("--max-package-weight-kg must be positive");
        }
        if self.max_distance_km <= 0.0 {
            anyhow::bail!("--max-distance-km must be positive");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
