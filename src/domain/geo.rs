// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Geodesic primitives shared by the service-area validator and dispatch engine.

use serde::{Deserialize, Serialize};

/// Mean earth radius used for Haversine distance, in metres (WGS-84 sphere).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair, always in the wire-facing `{latitude, longitude}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Great-circle distance between two points, in metres.
pub fn haversine_distance_m(a: Point, b: Point) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_distance_km(a: Point, b: Point) -> f64 {
    haversine_distance_m(a, b) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = Point::new(12.9716, 77.5946);
        assert!(haversine_distance_m(p, p) < 1e-6);
    }

    #[test]
    fn one_degree_longitude_at_equator_is_about_111km() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        let km = haversine_distance_km(a, b);
        assert!((km - 111.19).abs() < 0.5, "got {km}");
    }

    proptest::proptest! {
        #[test]
        fn distance_is_symmetric(
            lat1 in -80.0f64..80.0, lng1 in -179.0f64..179.0,
            lat2 in -80.0f64..80.0, lng2 in -179.0f64..179.0,
        ) {
            let a = Point::new(lat1, lng1);
            let b = Point::new(lat2, lng2);
            let d1 = haversine_distance_m(a, b);
            let d2 = haversine_distance_m(b, a);
            proptest::prop_assert!((d1 - d2).abs() < 1e-6);
        }

        #[test]
        fn distance_is_non_negative(
            lat1 in -80.0f64..80.0, lng1 in -179.0f64..179.0,
            lat2 in -80.0f64..80.0, lng2 in -179.0f64..179.0,
        ) {
            let a = Point::new(lat1, lng1);
            let b = Point::new(lat2, lng2);
            proptest::prop_assert!(haversine_distance_m(a, b) >= 0.0);
        }
    }
}
