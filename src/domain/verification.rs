// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verification Engine (C3, spec §4.2): derives a driver's overall
//! verification status from the five required document records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    DrivingLicense,
    AadhaarCard,
    BikeInsurance,
    RcBook,
    ProfilePhoto,
}

impl DocumentKind {
    pub const REQUIRED: [DocumentKind; 5] = [
        DocumentKind::DrivingLicense,
        DocumentKind::AadhaarCard,
        DocumentKind::BikeInsurance,
        DocumentKind::RcBook,
        DocumentKind::ProfilePhoto,
    ];

    /// The canonical snake_case storage key new writers must use (spec §9).
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::DrivingLicense => "driving_license",
            Self::AadhaarCard => "aadhaar_card",
            Self::BikeInsurance => "bike_insurance",
            Self::RcBook => "rc_book",
            Self::ProfilePhoto => "profile_photo",
        }
    }

    /// The legacy camelCase key some stored rows still carry.
    pub fn legacy_camel_key(&self) -> &'static str {
        match self {
            Self::DrivingLicense => "drivingLicense",
            Self::AadhaarCard => "aadhaarCard",
            Self::BikeInsurance => "bikeInsurance",
            Self::RcBook => "rcBook",
            Self::ProfilePhoto => "profilePhoto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub url: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub status: DocStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NotUploaded,
    PendingVerification,
    Rejected,
    Verified,
    /// Admin-granted superset of `Verified` (spec §9 open question).
    Approved,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotUploaded => "not_uploaded",
            Self::PendingVerification => "pending_verification",
            Self::Rejected => "rejected",
            Self::Verified => "verified",
            Self::Approved => "approved",
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified | Self::Approved)
    }
}

/// A driver's document map, keyed by the canonical [`DocumentKind`].
///
/// Raw storage rows may carry camelCase or snake_case keys; normalizing that
/// into this map is [`crate::compat::lookup_document`]'s job, not this one's.
pub type DocumentMap = BTreeMap<DocumentKind, DocumentRecord>;

/// Classify a single document's effective status, per the "exists" and
/// classification rules in spec §4.2 step 2-3. Since [`DocumentRecord`]
/// already carries a clean [`DocStatus`], classification here is direct;
/// the legacy `verified=true`/`verificationStatus=approved`-style field
/// soup described in the spec is resolved at the storage boundary.
fn classify(record: &DocumentRecord) -> DocStatus {
    record.status
}

/// Compute the overall verification status for a driver from their document
/// map, following the table in spec §4.2. `previously_approved` carries
/// forward an admin-granted `approved` status once all documents verify
/// again (spec §9: `approved` is a superset of `verified`).
pub fn compute_verification_status(
    documents: &DocumentMap,
    previously_approved: bool,
) -> VerificationStatus {
    let existing: Vec<&DocumentRecord> =
        DocumentKind::REQUIRED.iter().filter_map(|k| documents.get(k)).collect();

    if existing.is_empty() {
        return VerificationStatus::NotUploaded;
    }

    let any_rejected = DocumentKind::REQUIRED
        .iter()
        .filter_map(|k| documents.get(k))
        .any(|r| classify(r) == DocStatus::Rejected);
    if any_rejected {
        return VerificationStatus::Rejected;
    }

    let all_verified = DocumentKind::REQUIRED
        .iter()
        .all(|k| documents.get(k).map(|r| classify(r) == DocStatus::Verified).unwrap_or(false));

    if all_verified {
        if previously_approved {
            VerificationStatus::Approved
        } else {
            VerificationStatus::Verified
        }
    } else {
        VerificationStatus::PendingVerification
    }
}
