//! Session gate in front of the dashboard.
//!
//! This is a placeholder login, not a security boundary: a credential check
//! sets a persisted flag, and dashboard commands only look for that flag.
//! There is no expiry and no server-side validation.

use std::sync::Arc;

use thiserror::Error;

use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;

/// Storage key holding the session flag.
pub const AUTH_KEY: &str = "isAuthenticated";

const AUTH_VALUE: &str = "true";

/// Username/password pair as typed by the user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid credentials")]
pub struct AuthRejection;

/// Pluggable credential check.
pub trait Authenticator: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> std::result::Result<Session, AuthRejection>;
}

/// Accepts exactly one fixed pair, `admin` / `password` by default.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    username: String,
    password: String,
}

impl StaticAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for StaticAuthenticator {
    fn default() -> Self {
        Self::new("admin", "password")
    }
}

impl Authenticator for StaticAuthenticator {
    fn verify(&self, credentials: &Credentials) -> std::result::Result<Session, AuthRejection> {
        if credentials.username == self.username && credentials.password == self.password {
            Ok(Session {
                username: credentials.username.clone(),
            })
        } else {
            Err(AuthRejection)
        }
    }
}

/// Login/logout against a persisted flag.
pub struct SessionGate {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn KeyValueStore>,
}

impl SessionGate {
    pub fn new(authenticator: Arc<dyn Authenticator>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            authenticator,
            store,
        }
    }

    /// Gate using the built-in credential pair.
    pub fn with_default_credentials(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(Arc::new(StaticAuthenticator::default()), store)
    }

    /// Check credentials and persist the flag on success.
    ///
    /// A rejection leaves any existing flag untouched. There is no lockout.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        match self.authenticator.verify(credentials) {
            Ok(session) => {
                self.store.set_item(AUTH_KEY, AUTH_VALUE).await?;
                log::info!("Login successful for '{}'", session.username);
                Ok(session)
            }
            Err(rejection) => {
                log::warn!("Login rejected for '{}'", credentials.username);
                Err(AppError::auth(rejection))
            }
        }
    }

    /// Clear the persisted flag.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove_item(AUTH_KEY).await?;
        log::info!("Logged out");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.store.get_item(AUTH_KEY).await?.as_deref() == Some(AUTH_VALUE))
    }

    /// Fail with [`AppError::NotAuthenticated`] unless the flag is present.
    pub async fn require(&self) -> Result<()> {
        if self.is_authenticated().await? {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn open_gate(tmp: &TempDir) -> (SessionGate, Arc<LocalStorage>) {
        let store = Arc::new(LocalStorage::new(tmp.path()));
        (SessionGate::with_default_credentials(store.clone()), store)
    }

    #[tokio::test]
    async fn login_with_demo_pair_persists_flag() {
        let tmp = TempDir::new().unwrap();
        let (gate, store) = open_gate(&tmp);

        let session = gate
            .login(&Credentials::new("admin", "password"))
            .await
            .unwrap();
        assert_eq!(session.username, "admin");
        assert_eq!(store.get_item(AUTH_KEY).await.unwrap().as_deref(), Some("true"));
        assert!(gate.require().await.is_ok());
    }

    #[tokio::test]
    async fn other_pairs_leave_flag_unset() {
        let tmp = TempDir::new().unwrap();
        let (gate, store) = open_gate(&tmp);

        for (user, pass) in [("admin", "Password"), ("root", "password"), ("", "")] {
            let result = gate.login(&Credentials::new(user, pass)).await;
            assert!(matches!(result, Err(AppError::Auth(_))));
        }
        assert_eq!(store.get_item(AUTH_KEY).await.unwrap(), None);
        assert!(matches!(gate.require().await, Err(AppError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn logout_clears_flag_across_restarts() {
        let tmp = TempDir::new().unwrap();
        {
            let (gate, _) = open_gate(&tmp);
            gate.login(&Credentials::new("admin", "password"))
                .await
                .unwrap();
        }

        let (gate, _) = open_gate(&tmp);
        assert!(gate.is_authenticated().await.unwrap());

        gate.logout().await.unwrap();
        let (reopened, _) = open_gate(&tmp);
        assert!(matches!(reopened.require().await, Err(AppError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn flag_must_hold_expected_value() {
        let tmp = TempDir::new().unwrap();
        let (gate, store) = open_gate(&tmp);

        store.set_item(AUTH_KEY, "false").await.unwrap();
        assert!(!gate.is_authenticated().await.unwrap());
    }

    #[test]
    fn custom_authenticator_is_pluggable() {
        let auth = StaticAuthenticator::new("ops", "s3cret");
        assert!(auth.verify(&Credentials::new("ops", "s3cret")).is_ok());
        assert_eq!(
            auth.verify(&Credentials::new("admin", "password")),
            Err(AuthRejection)
        );
    }
}
