//! JWT Claims structure

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// User id
    pub uid: i32,

    /// Back-office capability
    #[serde(default)]
    pub admin: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims; `exp` is filled in by `JwtService`
    pub fn new(user_id: i32, username: &str, admin: bool) -> Self {
        Self {
            sub: username.to_string(),
            uid: user_id,
            admin,
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create claims expiring `expires_in_secs` from now
    pub fn with_expiration(user_id: i32, username: &str, admin: bool, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: username.to_string(),
            uid: user_id,
            admin,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    pub fn username(&self) -> &str {
        &self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_with_expiration() {
        let claims = Claims::with_expiration(7, "admin", true, 600);
        assert_eq!(claims.username(), "admin");
        assert_eq!(claims.uid, 7);
        assert!(!claims.is_expired());

        let now = Utc::now().timestamp();
        assert!(claims.exp > now && claims.exp <= now + 600);
    }

    #[test]
    fn test_expired_claims() {
        let mut claims = Claims::new(1, "user", false);
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        assert!(claims.is_expired());
    }

    #[test]
    fn test_missing_admin_claim_defaults_to_false() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"x","uid":1,"iat":0,"exp":0}"#).unwrap();
        assert!(!claims.admin);
    }
}
