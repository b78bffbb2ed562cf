// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compatibility normalization rules (spec §9). These are data-boundary
//! concerns only and must never leak into wire-facing APIs.

use crate::domain::geo::Point;
use crate::domain::verification::{DocumentKind, DocumentMap, DocumentRecord};
use serde_json::Value;

/// Whether a driver id string, once trimmed, actually denotes an assigned
/// driver rather than one of the legacy "absent" sentinels (`""`,
/// whitespace-only, `"0"`, `"false"`) a prior writer may have left behind
/// (I1).
///
/// Used directly against already-typed `Option<String>` fields (the
/// in-memory store's read boundary); [`normalize_driver_id`] is the
/// equivalent for a raw, not-yet-typed JSON value.
pub fn is_present_driver_id(raw: &str) -> bool {
    !matches!(raw.trim(), "" | "0" | "false")
}

/// Normalize a raw stored `driverId` value to `None` when it means "absent".
///
/// Legacy writes may leave `null`, `undefined` (absent key), `""`,
/// whitespace-only strings, or even `0`/`false` in place of a real id. All
/// of these normalize to "no driver assigned" (I1).
pub fn normalize_driver_id(raw: Option<&Value>) -> Option<String> {
    match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if is_present_driver_id(trimmed) {
                Some(trimmed.to_owned())
            } else {
                None
            }
        }
        Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) if n.as_i64() == Some(0) => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Look up a document record under both its canonical snake_case key and
/// its legacy camelCase key. New writers standardize on snake_case; readers
/// must still see older camelCase rows.
pub fn lookup_document<'a>(raw: &'a serde_json::Map<String, Value>, kind: DocumentKind) -> Option<&'a Value> {
    raw.get(kind.storage_key()).or_else(|| raw.get(kind.legacy_camel_key()))
}

/// Build a clean [`DocumentMap`] from a raw per-document JSON object,
/// resolving camelCase/snake_case key compatibility and the legacy
/// `verified`/`rejected` boolean-or-string-status field soup into a single
/// [`crate::domain::verification::DocStatus`].
pub fn normalize_documents(raw: &serde_json::Map<String, Value>) -> DocumentMap {
    use crate::domain::verification::DocStatus;

    let mut out = DocumentMap::new();
    for kind in DocumentKind::REQUIRED {
        let Some(doc) = lookup_document(raw, kind).and_then(|v| v.as_object()) else {
            continue;
        };
        let url = doc.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_owned();
        let has_url = !url.is_empty();
        let has_status = doc.get("status").is_some() || doc.get("verificationStatus").is_some();
        if !has_url && !has_status {
            continue;
        }

        let rejected = doc.get("rejected").and_then(|v| v.as_bool()).unwrap_or(false)
            || matches!(doc.get("status").and_then(|v| v.as_str()), Some("rejected"))
            || matches!(doc.get("verificationStatus").and_then(|v| v.as_str()), Some("rejected"));

        let verified = doc.get("verified").and_then(|v| v.as_bool()).unwrap_or(false)
            || matches!(doc.get("status").and_then(|v| v.as_str()), Some("verified"))
            || matches!(
                doc.get("verificationStatus").and_then(|v| v.as_str()),
                Some("verified") | Some("approved")
            );

        let status = if rejected {
            DocStatus::Rejected
        } else if verified {
            DocStatus::Verified
        } else {
            DocStatus::Pending
        };

        let uploaded_at = doc
            .get("uploadedAt")
            .or_else(|| doc.get("uploaded_at"))
            .and_then(|v| v.as_str())
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(chrono::Utc::now);

        out.insert(kind, DocumentRecord { url, uploaded_at, status });
    }
    out
}

/// Normalize a stored geopoint to the wire-facing `{latitude, longitude}`
/// shape, accepting the legacy `_latitude`/`_longitude` store representation.
pub fn normalize_geopoint(raw: &Value) -> Option<Point> {
    let obj = raw.as_object()?;
    let lat = obj
        .get("latitude")
        .or_else(|| obj.get("_latitude"))
        .or_else(|| obj.get("lat"))
        .and_then(|v| v.as_f64())?;
    let lng = obj
        .get("longitude")
        .or_else(|| obj.get("_longitude"))
        .or_else(|| obj.get("lng"))
        .and_then(|v| v.as_f64())?;
    Some(Point::new(lat, lng))
}
