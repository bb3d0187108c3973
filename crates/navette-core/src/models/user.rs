//! User model
//!
//! Back-office accounts used for authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i32,

    /// Username (unique, for login)
    pub username: String,

    /// Password hash (never expose in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Email address
    pub email: Option<String>,

    /// Grants access to the back-office
    pub is_admin: bool,

    /// Whether user is active
    pub active: bool,

    /// Last login timestamp
    pub last_login: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user can perform admin actions
    pub fn can_admin(&self) -> bool {
        self.active && self.is_admin
    }

    /// Check if user is active and can login
    pub fn can_login(&self) -> bool {
        self.active
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username: String::new(),
            password_hash: String::new(),
            email: None,
            is_admin: false,
            active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User info for API responses (without sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            last_login: user.last_login,
        }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_admin_cannot_admin() {
        let user = User {
            is_admin: true,
            active: false,
            ..Default::default()
        };
        assert!(!user.can_admin());
        assert!(!user.can_login());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            username: "admin".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
