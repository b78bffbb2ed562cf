// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verification Engine (C3, spec §4.2) orchestration: applies a single
//! document write (upload or admin review) to a driver's document map,
//! recomputes the overall status, and writes the audit trail.
//!
//! [`crate::domain::verification`] holds the pure classification rules;
//! this module is the stateful half that touches the store, following the
//! split the teacher draws between pure helpers and the `Store`-bound
//! handlers that call them.

use crate::compat;
use crate::domain::user::User;
use crate::domain::verification::{compute_verification_status, DocStatus, DocumentKind, DocumentRecord, VerificationStatus};
use crate::error::CoreError;
use crate::store::memory::{DocumentVerificationRequest, Store};

/// Write (or overwrite) one document's status for a driver, then recompute
/// `verification_status`/`is_verified` from the full document map (I3).
pub fn review_document(
    store: &Store,
    driver_id: &str,
    kind: DocumentKind,
    status: DocStatus,
    url: Option<String>,
    reviewed_by: Option<String>,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<User, CoreError> {
    let mut user = store.users.get(driver_id).ok_or_else(|| CoreError::NotFound(driver_id.to_owned()))?;
    let profile = user.driver.as_mut().ok_or_else(|| CoreError::Validation("not a driver account".into()))?;

    let previous_status = profile.verification_status;
    let existing_url = profile.documents.get(&kind).map(|r| r.url.clone()).unwrap_or_default();
    profile.documents.insert(kind, DocumentRecord { url: url.unwrap_or(existing_url), uploaded_at: at, status });

    let new_status = compute_verification_status(&profile.documents, profile.previously_approved);
    profile.verification_status = new_status;
    profile.is_verified = new_status.is_verified();
    if new_status == VerificationStatus::Approved {
        profile.previously_approved = true;
    }

    store.users.put(driver_id, user.clone());
    store.invalidate_verification_cache(driver_id);
    store.verification_requests.put(
        &format!("{driver_id}:{kind:?}:{}", at.timestamp_nanos_opt().unwrap_or_default()),
        DocumentVerificationRequest { driver_id: driver_id.to_owned(), previous_status, new_status, reviewed_by, at },
    );

    Ok(user)
}

/// Admin-only escalation: grant `approved`, a superset of `verified` (spec §9).
pub fn grant_approved(store: &Store, driver_id: &str, reviewed_by: &str, at: chrono::DateTime<chrono::Utc>) -> Result<User, CoreError> {
    let mut user = store.users.get(driver_id).ok_or_else(|| CoreError::NotFound(driver_id.to_owned()))?;
    let profile = user.driver.as_mut().ok_or_else(|| CoreError::Validation("not a driver account".into()))?;
    if !profile.verification_status.is_verified() {
        return Err(CoreError::Validation("driver must be verified before approval".into()));
    }
    let previous_status = profile.verification_status;
    profile.previously_approved = true;
    profile.verification_status = VerificationStatus::Approved;
    profile.is_verified = true;
    store.users.put(driver_id, user.clone());
    store.invalidate_verification_cache(driver_id);
    store.verification_requests.put(
        &format!("{driver_id}:approved:{}", at.timestamp_nanos_opt().unwrap_or_default()),
        DocumentVerificationRequest {
            driver_id: driver_id.to_owned(),
            previous_status,
            new_status: VerificationStatus::Approved,
            reviewed_by: Some(reviewed_by.to_owned()),
            at,
        },
    );
    Ok(user)
}

/// Merge a raw legacy driver record (camelCase document keys, `verified`/
/// `verificationStatus` field soup, `_latitude`/`_longitude` geopoint shape)
/// into an already-registered driver, via the spec §9 normalization rules,
/// and recompute `verification_status` from the merged document map.
///
/// The admin-only import path for backfilling drivers from a system that
/// predates the canonical storage shapes.
pub fn import_legacy_record(store: &Store, driver_id: &str, raw: &serde_json::Value) -> Result<User, CoreError> {
    let mut user = store.users.get(driver_id).ok_or_else(|| CoreError::NotFound(driver_id.to_owned()))?;
    let profile = user.driver.as_mut().ok_or_else(|| CoreError::Validation("not a driver account".into()))?;

    if let Some(docs_raw) = raw.get("documents").and_then(|v| v.as_object()) {
        for (kind, record) in compat::normalize_documents(docs_raw) {
            profile.documents.insert(kind, record);
        }
    }

    if let Some(loc_raw) = raw.get("currentLocation").or_else(|| raw.get("current_location")) {
        if let Some(coords) = compat::normalize_geopoint(loc_raw) {
            profile.current_location = Some(crate::domain::user::DriverLocation {
                coords,
                timestamp: chrono::Utc::now(),
                accuracy: None,
                speed: None,
                bearing: None,
            });
        }
    }

    let new_status = compute_verification_status(&profile.documents, profile.previously_approved);
    profile.verification_status = new_status;
    profile.is_verified = new_status.is_verified();
    if new_status == VerificationStatus::Approved {
        profile.previously_approved = true;
    }

    store.users.put(driver_id, user.clone());
    store.invalidate_verification_cache(driver_id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::User;

    fn driver(store: &Store) -> User {
        let user = User::new_driver("+911234500000", "Asha");
        store.users.put(&user.user_id, user.clone());
        user
    }

    #[test]
    fn four_verified_one_pending_is_pending_overall() {
        let store = Store::new();
        let user = driver(&store);
        let now = chrono::Utc::now();
        for kind in [DocumentKind::DrivingLicense, DocumentKind::AadhaarCard, DocumentKind::BikeInsurance, DocumentKind::RcBook] {
            review_document(&store, &user.user_id, kind, DocStatus::Verified, Some("https://x".into()), None, now).unwrap();
        }
        let updated = store.users.get(&user.user_id).unwrap();
        assert_eq!(updated.driver.unwrap().verification_status, VerificationStatus::PendingVerification);
    }

    #[test]
    fn fifth_document_flips_to_verified_and_invalidates_cache() {
        let store = Store::new();
        let user = driver(&store);
        store.cache_verification_status(&user.user_id, VerificationStatus::PendingVerification);
        let now = chrono::Utc::now();
        for kind in DocumentKind::REQUIRED {
            review_document(&store, &user.user_id, kind, DocStatus::Verified, Some("https://x".into()), None, now).unwrap();
        }
        let updated = store.users.get(&user.user_id).unwrap();
        let profile = updated.driver.unwrap();
        assert_eq!(profile.verification_status, VerificationStatus::Verified);
        assert!(profile.is_verified);
        assert_eq!(store.cached_verification_status(&user.user_id), None);
    }

    #[test]
    fn any_rejection_dominates_regardless_of_order() {
        let store = Store::new();
        let user = driver(&store);
        let now = chrono::Utc::now();
        for kind in DocumentKind::REQUIRED {
            review_document(&store, &user.user_id, kind, DocStatus::Verified, Some("https://x".into()), None, now).unwrap();
        }
        review_document(&store, &user.user_id, DocumentKind::ProfilePhoto, DocStatus::Rejected, None, Some("admin1".into()), now)
            .unwrap();
        let updated = store.users.get(&user.user_id).unwrap();
        assert_eq!(updated.driver.unwrap().verification_status, VerificationStatus::Rejected);
    }

    #[test]
    fn grant_approved_requires_prior_verification() {
        let store = Store::new();
        let user = driver(&store);
        let err = grant_approved(&store, &user.user_id, "admin1", chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn grant_approved_escalates_verified_driver() {
        let store = Store::new();
        let user = driver(&store);
        let now = chrono::Utc::now();
        for kind in DocumentKind::REQUIRED {
            review_document(&store, &user.user_id, kind, DocStatus::Verified, Some("https://x".into()), None, now).unwrap();
        }
        grant_approved(&store, &user.user_id, "admin1", now).unwrap();
        let updated = store.users.get(&user.user_id).unwrap();
        assert_eq!(updated.driver.unwrap().verification_status, VerificationStatus::Approved);
    }

    #[test]
    fn import_legacy_record_resolves_camel_case_documents_and_geopoint() {
        let store = Store::new();
        let user = driver(&store);
        let raw = serde_json::json!({
            "documents": {
                "drivingLicense": {"url": "https://x", "verificationStatus": "approved"},
                "aadhaarCard": {"url": "https://x", "status": "verified"},
                "bikeInsurance": {"url": "https://x", "verified": true},
                "rcBook": {"url": "https://x", "status": "verified"},
                "profilePhoto": {"url": "https://x", "status": "verified"},
            },
            "currentLocation": {"_latitude": 12.9, "_longitude": 77.5},
        });

        let updated = import_legacy_record(&store, &user.user_id, &raw).unwrap();
        let profile = updated.driver.unwrap();
        assert_eq!(profile.verification_status, VerificationStatus::Verified);
        assert_eq!(profile.current_location.unwrap().coords, crate::domain::geo::Point::new(12.9, 77.5));
    }

    #[test]
    fn import_legacy_record_requires_driver_account() {
        let store = Store::new();
        let user = User::new_customer("+911234500001", "Ravi");
        store.users.put(&user.user_id, user.clone());
        let err = import_legacy_record(&store, &user.user_id, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
