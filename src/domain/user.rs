// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User entity (spec §3) and the deterministic role-based user id.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::geo::Point;
use crate::domain::verification::{DocumentMap, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Customer,
    Driver,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Driver => "driver",
            Self::Admin => "admin",
        }
    }
}

/// Admin permission role, distinct from [`UserType::Admin`]'s coarse grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
}

/// Deterministic, stable-across-runs `userId` from `(phone, userType)`.
///
/// Lets one phone number hold distinct customer and driver identities
/// (glossary: "role-based userId").
pub fn derive_user_id(phone: &str, user_type: UserType) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone.trim().as_bytes());
    hasher.update(b"|");
    hasher.update(user_type.as_str().as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 20)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut s = String::with_capacity(chars);
    for byte in bytes {
        s.push_str(&format!("{byte:02x}"));
        if s.len() >= chars {
            break;
        }
    }
    s.truncate(chars);
    s
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceAvailability {
    Available,
    Unavailable,
}

/// Driver-only fields, present iff `user_type == Driver`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverProfile {
    pub verification_status: VerificationStatus,
    pub is_verified: bool,
    pub is_online: bool,
    pub is_available: bool,
    pub current_location: Option<DriverLocation>,
    pub current_booking_id: Option<String>,
    pub rating: f64,
    pub trip_count: u64,
    pub last_seen: chrono::DateTime<chrono::Utc>,
    /// Source documents the Verification Engine (C3) derives
    /// `verification_status` from; admin-review writes land here.
    pub documents: DocumentMap,
    /// Carries forward an admin-granted `approved` status once all
    /// documents verify again (spec §9: `approved` is a superset of `verified`).
    pub previously_approved: bool,
}

impl Default for DriverProfile {
    fn default() -> Self {
        Self {
            verification_status: VerificationStatus::NotUploaded,
            is_verified: false,
            is_online: false,
            is_available: false,
            current_location: None,
            current_booking_id: None,
            rating: 0.0,
            trip_count: 0,
            last_seen: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            documents: DocumentMap::new(),
            previously_approved: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriverLocation {
    pub coords: Point,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
    pub bearing: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub phone: String,
    pub user_type: UserType,
    pub admin_role: Option<AdminRole>,
    pub name: String,
    pub vehicle_number: Option<String>,
    pub deactivated: bool,
    pub driver: Option<DriverProfile>,
}

impl User {
    pub fn new_customer(phone: &str, name: impl Into<String>) -> Self {
        Self {
            user_id: derive_user_id(phone, UserType::Customer),
            phone: phone.to_owned(),
            user_type: UserType::Customer,
            admin_role: None,
            name: name.into(),
            vehicle_number: None,
            deactivated: false,
            driver: None,
        }
    }

    pub fn new_driver(phone: &str, name: impl Into<String>) -> Self {
        Self {
            user_id: derive_user_id(phone, UserType::Driver),
            phone: phone.to_owned(),
            user_type: UserType::Driver,
            admin_role: None,
            name: name.into(),
            vehicle_number: None,
            deactivated: false,
            driver: Some(DriverProfile::default()),
        }
    }

    pub fn is_eligible_candidate(&self) -> bool {
        match &self.driver {
            Some(d) => {
                d.is_online
                    && d.is_available
                    && matches!(
                        d.verification_status,
                        VerificationStatus::Verified | VerificationStatus::Approved
                    )
                    && d.current_location.is_some()
            }
            None => false,
        }
    }
}
