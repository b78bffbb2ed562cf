// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborator traits (spec §6). Each boundary the core depends on
//! but does not own is modeled as a trait, following the teacher's own
//! collaborator boundaries (`Backend`, `Detector`, `NudgeEncoder`), so the
//! core is testable without real infrastructure.

use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::geo::Point;
use crate::domain::user::{AdminRole, UserType};
use crate::error::ErrorCode;

/// Decoded bearer-token claims, verified by an [`AuthProvider`].
///
/// `role` is present only for `user_type == Admin` (spec §6's
/// `{userId, userType, role, phone}` contract); admin permission checks
/// read it directly instead of re-fetching the user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub user_type: UserType,
    #[serde(default)]
    pub role: Option<AdminRole>,
    pub phone: String,
    pub exp: usize,
}

/// Out-of-scope authentication-provider boundary (spec §1): this crate never
/// issues OTPs or mints tokens, only verifies them.
pub trait AuthProvider: Send + Sync {
    fn verify(&self, bearer_token: &str) -> Result<Claims, ErrorCode>;
}

/// Default `AuthProvider`: HS256 JWT verification against a single shared
/// secret, grounded on the `jsonwebtoken` dependency used for the same
/// purpose in the pack's `freightdev-Codriver` and
/// `kcirtapfromspace-offleash` manifests.
pub struct JwtAuthProvider {
    secret: String,
}

impl JwtAuthProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl AuthProvider for JwtAuthProvider {
    fn verify(&self, bearer_token: &str) -> Result<Claims, ErrorCode> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let data = jsonwebtoken::decode::<Claims>(bearer_token, &key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ErrorCode::TokenExpired,
                _ => ErrorCode::InvalidToken,
            })?;
        Ok(data.claims)
    }
}

/// Map-provider boundary (spec §1, out of scope): this crate never calls an
/// external routing API; production deployments inject one here. The core
/// always falls back to Haversine (§4.5) on `Err`.
pub trait MapProvider: Send + Sync {
    fn distance_km(&self, origin: Point, dest: Point) -> Result<f64, ErrorCode>;
}

/// Default `MapProvider` that always fails over to Haversine, matching
/// §4.5's stated fallback behavior.
pub struct NullMapProvider;

impl MapProvider for NullMapProvider {
    fn distance_km(&self, _origin: Point, _dest: Point) -> Result<f64, ErrorCode> {
        Err(ErrorCode::UpstreamUnavailable)
    }
}

/// Object-storage boundary (spec §1, out of scope): the core never decodes
/// uploaded image/PDF bytes, only stores a URL against a document record.
pub trait ObjectStorage: Send + Sync {
    fn put(&self, driver_id: &str, kind: &str, bytes: &[u8]) -> Result<String, ErrorCode>;
}

/// In-memory `ObjectStorage`, for tests and the zero-dependency default.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    objects: dashmap::DashMap<String, Vec<u8>>,
}

impl ObjectStorage for InMemoryObjectStorage {
    fn put(&self, driver_id: &str, kind: &str, bytes: &[u8]) -> Result<String, ErrorCode> {
        let url = format!("mem://{driver_id}/{kind}/{}", self.objects.len());
        self.objects.insert(url.clone(), bytes.to_vec());
        Ok(url)
    }
}

/// Push-notification boundary (spec §1, out of scope): the session plane is
/// the primary real-time channel; this is the offline fallback.
pub trait PushNotifier: Send + Sync {
    fn send(&self, device_token: &str, title: &str, body: &str);
}

/// No-op default: logs at `debug!` instead of calling a push gateway.
#[derive(Default)]
pub struct NoopPushNotifier;

impl PushNotifier for NoopPushNotifier {
    fn send(&self, device_token: &str, title: &str, body: &str) {
        tracing::debug!(device_token, title, body, "push notification suppressed (no provider configured)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    #[test]
    fn jwt_provider_round_trips_valid_token() {
        let claims =
            Claims { user_id: "d1".into(), user_type: UserType::Driver, role: None, phone: "+910000000000".into(), exp: 9_999_999_999 };
        let token =
            jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s3cret")).unwrap();

        let provider = JwtAuthProvider::new("s3cret");
        let decoded = provider.verify(&token).unwrap();
        assert_eq!(decoded.user_id, "d1");
    }

    #[test]
    fn jwt_provider_rejects_wrong_secret() {
        let claims =
            Claims { user_id: "d1".into(), user_type: UserType::Driver, role: None, phone: "+910000000000".into(), exp: 9_999_999_999 };
        let token =
            jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s3cret")).unwrap();

        let provider = JwtAuthProvider::new("wrong");
        assert_eq!(provider.verify(&token).unwrap_err(), ErrorCode::InvalidToken);
    }

    #[test]
    fn null_map_provider_always_fails_over() {
        let p = NullMapProvider;
        assert!(p.distance_km(Point::new(0.0, 0.0), Point::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn in_memory_storage_round_trips() {
        let storage = InMemoryObjectStorage::default();
        let url = storage.put("d1", "driving_license", b"data").unwrap();
        assert!(url.starts_with("mem://d1/driving_license/"));
    }
}
