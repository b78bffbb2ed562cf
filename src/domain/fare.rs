// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fare computation pipeline (spec §4.5): base + distance, weight tier,
//! time-of-day surge, rounded to whole currency units.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Only vehicle type currently supported by the fare pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[serde(rename = "2_wheeler")]
    TwoWheeler,
}

/// Fare parameters, sourced from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct FareRates {
    /// Base fare, minor currency units.
    pub base_fare: i64,
    /// Per-kilometre rate, minor currency units.
    pub per_km_rate: i64,
}

/// The fully itemized fare, persisted verbatim with the booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: i64,
    pub distance_charge: i64,
    pub weight_multiplier: f64,
    pub surge_multiplier: f64,
    pub subtotal: i64,
    pub total: i64,
    pub currency: &'static str,
}

fn weight_multiplier(weight_kg: f64) -> f64 {
    if weight_kg > 10.0 {
        1.2
    } else if weight_kg > 5.0 {
        1.1
    } else {
        1.0
    }
}

/// Surge multiplier for the given local wall-clock hour.
///
/// Peak band 08:00-10:00 -> 1.2x. Late-night band 22:00-06:00 -> 1.3x. Else
/// 1x. Fixed per spec §4.5 step 3: not configurable.
fn surge_multiplier(hour: u32) -> f64 {
    if (8..10).contains(&hour) {
        1.2
    } else if hour >= 22 || hour < 6 {
        1.3
    } else {
        1.0
    }
}

/// Compute the fare for a trip. `at` is the local wall-clock time the
/// booking request was made (drives the surge band).
pub fn compute_fare(
    rates: FareRates,
    distance_km: f64,
    weight_kg: f64,
    _vehicle: VehicleType,
    at: chrono::DateTime<chrono::Utc>,
) -> FareBreakdown {
    let distance_charge = (distance_km * rates.per_km_rate as f64).round() as i64;
    let subtotal = rates.base_fare + distance_charge;

    let w_mult = weight_multiplier(weight_kg);
    let s_mult = surge_multiplier(at.hour());

    let total = (subtotal as f64 * w_mult * s_mult).round() as i64;

    FareBreakdown {
        base_fare: rates.base_fare,
        distance_charge,
        weight_multiplier: w_mult,
        surge_multiplier: s_mult,
        subtotal,
        total,
        currency: "INR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rates() -> FareRates {
        FareRates { base_fare: 5000, per_km_rate: 1200 }
    }

    fn at(hour: u32) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 7, 28, hour, 0, 0).unwrap()
    }

    #[test]
    fn light_package_off_peak_has_no_multipliers() {
        let f = compute_fare(rates(), 10.0, 3.0, VehicleType::TwoWheeler, at(12));
        assert_eq!(f.weight_multiplier, 1.0);
        assert_eq!(f.surge_multiplier, 1.0);
        assert_eq!(f.subtotal, 5000 + 12000);
        assert_eq!(f.total, f.subtotal);
    }

    #[test]
    fn heavy_package_applies_weight_multiplier() {
        let f = compute_fare(rates(), 5.0, 12.0, VehicleType::TwoWheeler, at(12));
        assert_eq!(f.weight_multiplier, 1.2);
    }

    #[test]
    fn mid_weight_package_applies_intermediate_multiplier() {
        let f = compute_fare(rates(), 5.0, 7.0, VehicleType::TwoWheeler, at(12));
        assert_eq!(f.weight_multiplier, 1.1);
    }

    #[test]
    fn peak_hour_applies_surge() {
        let f = compute_fare(rates(), 5.0, 1.0, VehicleType::TwoWheeler, at(9));
        assert_eq!(f.surge_multiplier, 1.2);
    }

    #[test]
    fn late_night_applies_surge() {
        let f = compute_fare(rates(), 5.0, 1.0, VehicleType::TwoWheeler, at(23));
        assert_eq!(f.surge_multiplier, 1.3);
    }

    #[test]
    fn determinism_across_repeated_calls() {
        let a = compute_fare(rates(), 7.25, 6.0, VehicleType::TwoWheeler, at(9));
        let b = compute_fare(rates(), 7.25, 6.0, VehicleType::TwoWheeler, at(9));
        assert_eq!(a, b);
    }
}
