//! Session and identity provider.
//!
//! # Responsibility
//! - Accept trivial credentials and persist the account under `user`.
//! - Expose the current identity used to scope task storage.
//!
//! # Invariants
//! - Blank username or password never creates a session.
//! - An unreadable `user` payload is discarded and treated as signed out.

use crate::model::user::{Identity, UserAccount};
use crate::repo::kv_store::{KeyValueStore, StoreError, USER_KEY};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type SessionResult<T> = Result<T, SessionError>;

/// Login/logout write failures.
#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Encode(serde_json::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode account: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Supplies the signed-in identity, if any.
pub trait IdentityProvider {
    fn current_identity(&self) -> Option<Identity>;
}

impl IdentityProvider for Identity {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.clone())
    }
}

impl IdentityProvider for Option<Identity> {
    fn current_identity(&self) -> Option<Identity> {
        self.clone()
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn current_identity(&self) -> Option<Identity> {
        (**self).current_identity()
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn current_identity(&self) -> Option<Identity> {
        (**self).current_identity()
    }
}

/// Login/logout over the `user` slot.
pub struct SessionService<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SessionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Signs in with any non-blank credentials.
    ///
    /// Returns `Ok(None)` without touching storage when either value is blank.
    pub fn login(&self, username: &str, password: &str) -> SessionResult<Option<UserAccount>> {
        if username.trim().is_empty() || password.trim().is_empty() {
            info!("event=session_login module=session status=ignored reason=blank_credentials");
            return Ok(None);
        }

        let account = UserAccount::from_credentials(username, password);
        let payload = serde_json::to_string(&account)?;
        self.store.set(USER_KEY, &payload)?;
        info!("event=session_login module=session status=ok");
        Ok(Some(account))
    }

    pub fn logout(&self) -> SessionResult<()> {
        self.store.remove(USER_KEY)?;
        info!("event=session_logout module=session status=ok");
        Ok(())
    }

    /// Reads the stored account, discarding it if it does not parse.
    pub fn current_user(&self) -> Option<UserAccount> {
        let raw = match self.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                error!("event=session_read module=session status=error error={err}");
                return None;
            }
        };

        match serde_json::from_str::<UserAccount>(&raw) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(
                    "event=session_read module=session status=error error_code=user_parse_failed error={err}"
                );
                if let Err(err) = self.store.remove(USER_KEY) {
                    error!("event=session_reset module=session status=error error={err}");
                }
                None
            }
        }
    }
}

impl<S: KeyValueStore> IdentityProvider for SessionService<S> {
    fn current_identity(&self) -> Option<Identity> {
        self.current_user().map(|account| account.identity())
    }
}
