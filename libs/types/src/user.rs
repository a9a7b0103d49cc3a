//! User account type
//!
//! A user owns its orders and exactly one balance row (created alongside
//! the user at registration time).

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// A registered user. `login` is stored lowercased so that login is
/// case-insensitive at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub password_hash: String,
}

impl User {
    pub fn new(login: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            login: login.into().to_lowercase(),
            password_hash: password_hash.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_is_lowercased() {
        let user = User::new("Alice", "hash");
        assert_eq!(user.login, "alice");
    }
}
