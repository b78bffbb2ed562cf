// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-Area Validator (C4, spec §4.3).

use serde::{Deserialize, Serialize};

use crate::domain::geo::{haversine_distance_m, Point};

#[derive(Debug, Clone, Copy)]
pub struct ServiceAreaConfig {
    pub centre: Point,
    pub radius_min_m: f64,
    pub radius_max_m: f64,
    pub warning_threshold_m: f64,
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointValidation {
    pub valid: bool,
    pub warning: bool,
    pub distance_m: f64,
}

impl ServiceAreaConfig {
    pub fn validate_point(&self, p: Point) -> PointValidation {
        let distance_m = haversine_distance_m(self.centre, p);
        let valid = distance_m >= self.radius_min_m && distance_m <= self.radius_max_m;
        let warning = valid && distance_m >= self.warning_threshold_m;
        PointValidation { valid, warning, distance_m }
    }
}

/// Which leg of a booking failed the service-area check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pickup,
    Dropoff,
}

impl Endpoint {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pickup => "Pickup",
            Self::Dropoff => "Dropoff",
        }
    }
}

/// Validate both legs of a booking. Returns the first failing endpoint.
pub fn validate_booking(
    cfg: &ServiceAreaConfig,
    pickup: Point,
    dropoff: Point,
) -> Result<(), Endpoint> {
    if !cfg.validate_point(pickup).valid {
        return Err(Endpoint::Pickup);
    }
    if !cfg.validate_point(dropoff).valid {
        return Err(Endpoint::Dropoff);
    }
    Ok(())
}

/// Driver-go-online validation: under `strict`, refuse to flip online if the
/// driver's current location is outside the service area.
pub fn validate_driver_online(cfg: &ServiceAreaConfig, location: Point) -> bool {
    if !cfg.strict {
        return true;
    }
    cfg.validate_point(location).valid
}

/// Result of sampling a proposed route against the service area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteValidation {
    pub in_bounds: usize,
    pub out_of_bounds: usize,
    pub first_violation: Option<Point>,
}

/// Sample-validate a sequence of route points (§4.3's "route validation"
/// entry point named but unspecified in the distillation; see SPEC_FULL.md).
pub fn validate_route(cfg: &ServiceAreaConfig, points: &[Point]) -> RouteValidation {
    let mut in_bounds = 0;
    let mut out_of_bounds = 0;
    let mut first_violation = None;
    for &p in points {
        if cfg.validate_point(p).valid {
            in_bounds += 1;
        } else {
            out_of_bounds += 1;
            if first_violation.is_none() {
                first_violation = Some(p);
            }
        }
    }
    RouteValidation { in_bounds, out_of_bounds, first_violation }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ServiceAreaConfig {
        ServiceAreaConfig {
            centre: Point::new(12.9716, 77.5946),
            radius_min_m: 0.0,
            radius_max_m: 25_000.0,
            warning_threshold_m: 20_000.0,
            strict: true,
        }
    }

    #[test]
    fn centre_point_is_valid() {
        let v = cfg().validate_point(cfg().centre);
        assert!(v.valid);
        assert!(!v.warning);
    }

    #[test]
    fn far_point_is_invalid() {
        let far = Point::new(13.5, 78.5);
        assert!(!cfg().validate_point(far).valid);
    }

    #[test]
    fn booking_validation_names_dropoff_when_only_dropoff_fails() {
        let pickup = cfg().centre;
        let dropoff = Point::new(13.5, 78.5);
        assert_eq!(validate_booking(&cfg(), pickup, dropoff), Err(Endpoint::Dropoff));
    }

    #[test]
    fn booking_validation_names_pickup_first() {
        let pickup = Point::new(13.5, 78.5);
        let dropoff = cfg().centre;
        assert_eq!(validate_booking(&cfg(), pickup, dropoff), Err(Endpoint::Pickup));
    }

    #[test]
    fn strict_online_validation_rejects_outside_driver() {
        assert!(!validate_driver_online(&cfg(), Point::new(13.5, 78.5)));
    }

    #[test]
    fn non_strict_always_allows_online() {
        let mut c = cfg();
        c.strict = false;
        assert!(validate_driver_online(&c, Point::new(13.5, 78.5)));
    }

    #[test]
    fn route_validation_counts_violations() {
        let route = [cfg().centre, Point::new(13.5, 78.5), cfg().centre];
        let r = validate_route(&cfg(), &route);
        assert_eq!(r.in_bounds, 2);
        assert_eq!(r.out_of_bounds, 1);
        assert!(r.first_violation.is_some());
    }
}
