use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pactoria_core::enums::UserRole;
use pactoria_core::identity::AuthIdentity;

/// Verified access token claims.
///
/// Produced by [`crate::TokenIssuer::verify`], consumed by the server's auth
/// extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub company_id: String,
    pub role: UserRole,
    pub iss: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

impl Claims {
    /// Convert to a lightweight `AuthIdentity` for cross-crate passing.
    #[must_use]
    pub fn to_identity(&self) -> AuthIdentity {
        AuthIdentity {
            user_id: self.sub.clone(),
            company_id: self.company_id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at() <= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_claims(exp: DateTime<Utc>) -> Claims {
        Claims {
            sub: "usr-0000000a".into(),
            email: "owner@acme.co.uk".into(),
            company_id: "cmp-0000000a".into(),
            role: UserRole::Manager,
            iss: "pactoria".into(),
            iat: Utc::now().timestamp(),
            exp: exp.timestamp(),
            jti: "00ff".into(),
        }
    }

    #[test]
    fn to_identity_maps_all_fields() {
        let identity = make_claims(Utc::now() + chrono::TimeDelta::hours(1)).to_identity();
        assert_eq!(identity.user_id, "usr-0000000a");
        assert_eq!(identity.company_id, "cmp-0000000a");
        assert_eq!(identity.email, "owner@acme.co.uk");
        assert_eq!(identity.role, UserRole::Manager);
    }

    #[test]
    fn near_expiry_window() {
        assert!(!make_claims(Utc::now() + chrono::TimeDelta::hours(1)).is_near_expiry(60));
        assert!(make_claims(Utc::now() + chrono::TimeDelta::seconds(30)).is_near_expiry(60));
        assert!(make_claims(Utc::now() - chrono::TimeDelta::seconds(10)).is_near_expiry(0));
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_value(make_claims(Utc::now())).unwrap();
        assert_eq!(json["role"], "manager");
    }
}
