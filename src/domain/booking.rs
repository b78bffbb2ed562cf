// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking entity and lifecycle state machine (part of C6, spec §3, §4.6).

use serde::{Deserialize, Serialize};

use crate::domain::fare::FareBreakdown;
use crate::domain::geo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    DriverAssigned,
    DriverEnroute,
    DriverArrived,
    PickedUp,
    InTransit,
    AtDropoff,
    Delivered,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::DriverAssigned => "driver_assigned",
            Self::DriverEnroute => "driver_enroute",
            Self::DriverArrived => "driver_arrived",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::AtDropoff => "at_dropoff",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Glossary: "occupied states" — a driver may hold at most one booking
    /// in one of these at a time (I2).
    pub fn is_occupied(&self) -> bool {
        matches!(
            self,
            Self::DriverAssigned
                | Self::DriverEnroute
                | Self::DriverArrived
                | Self::PickedUp
                | Self::InTransit
                | Self::AtDropoff
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Ordered forward lifecycle, excluding the `cancelled` escape hatch.
    fn forward_order(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::DriverAssigned => Some(2),
            Self::DriverEnroute => Some(3),
            Self::DriverArrived => Some(4),
            Self::PickedUp => Some(5),
            Self::InTransit => Some(6),
            Self::AtDropoff => Some(7),
            Self::Delivered => Some(8),
            Self::Cancelled => None,
        }
    }

    /// Whether `self -> next` is a legal status-update transition.
    ///
    /// `cancelled` is reachable from any pre-pickup state (spec §1); forward
    /// lifecycle transitions otherwise advance exactly one step at a time.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if next == BookingStatus::Cancelled {
            const PICKED_UP_ORDER: u8 = 5;
            return matches!(self.forward_order(), Some(order) if order < PICKED_UP_ORDER);
        }
        match (self.forward_order(), next.forward_order()) {
            (Some(a), Some(b)) => b == a + 1,
            _ => false,
        }
    }

    /// Statuses cancellable per spec §4.6: `pending | confirmed | driver_assigned`.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::DriverAssigned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    PartiallyRefunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPoint {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub location: Point,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub weight_kg: f64,
    pub description: String,
    pub fragile: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timing {
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub assigned_at: Option<chrono::DateTime<chrono::Utc>>,
    pub picked_up_at: Option<chrono::DateTime<chrono::Utc>>,
    pub delivered_at: Option<chrono::DateTime<chrono::Utc>>,
    pub cancelled_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: String,
    pub reason: String,
    pub cancelled_at: chrono::DateTime<chrono::Utc>,
    pub refund_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub stars: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    /// Normalized per §9: `None` means "no driver assigned" regardless of
    /// the raw sentinel (`null`/empty/whitespace) a legacy writer may have
    /// used. See [`crate::compat::normalize_driver_id`].
    pub driver_id: Option<String>,
    pub status: BookingStatus,
    pub pickup: ContactPoint,
    pub dropoff: ContactPoint,
    pub package: Package,
    pub vehicle_type: crate::domain::fare::VehicleType,
    pub fare: FareBreakdown,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub timing: Timing,
    pub distance_km: f64,
    pub cancellation: Option<Cancellation>,
    pub rating: Option<Rating>,
}

impl Booking {
    /// I1, normalized: effectively unassigned iff `status == pending` and
    /// `driver_id` is absent after normalization.
    pub fn is_unassigned(&self) -> bool {
        let has_driver = self.driver_id.as_deref().is_some_and(crate::compat::is_present_driver_id);
        self.status == BookingStatus::Pending && !has_driver
    }
}
