//! Session account and identity model.
//!
//! # Invariants
//! - `email` is the owner scoping key for task records.
//! - `Identity` never carries the password.

use crate::model::task::OwnerId;
use serde::{Deserialize, Serialize};

/// Account payload persisted under the `user` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl UserAccount {
    /// Builds an account with an email derived from the username.
    pub fn from_credentials(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: password.to_string(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub email: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }

    /// Scoping key for task storage.
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.email.clone())
    }
}
