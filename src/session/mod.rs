//! Authenticated user session and its durable record

use crate::gateway::User;
use serde::{Deserialize, Serialize};

pub mod store;

pub use store::SessionStore;

/// The signed-in user, as returned by the auth endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<User> for Session {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

impl Session {
    /// First letter of the display name, for the avatar
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .or_else(|| self.email.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }
}
