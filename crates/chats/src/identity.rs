//! Source of the signed-in user.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::entities::User;
use crate::types::{ChatError, ChatResult};

/// Supplies the currently authenticated user
pub trait IdentityProvider {
    /// Fails with [`ChatError::NotAuthenticated`] when nobody is signed in
    fn current_user(&self) -> ChatResult<User>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn current_user(&self) -> ChatResult<User> {
        (**self).current_user()
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn current_user(&self) -> ChatResult<User> {
        (**self).current_user()
    }
}

/// Session store handed to the façade instead of shared global state
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: RwLock<Option<User>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that starts with `user` signed in
    pub fn signed_in(user: User) -> Self {
        Self {
            current: RwLock::new(Some(user)),
        }
    }

    pub fn sign_in(&self, user: User) {
        debug!(user_id = %user.id, "signing in");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    /// Sign out, returning the user that was signed in
    pub fn sign_out(&self) -> Option<User> {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user) = &previous {
            debug!(user_id = %user.id, "signed out");
        }
        previous
    }

    pub fn is_signed_in(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user(&self) -> ChatResult<User> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ChatError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_is_not_authenticated() {
        let session = SessionIdentity::new();
        assert!(!session.is_signed_in());
        assert!(matches!(
            session.current_user(),
            Err(ChatError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_sign_in_and_out() {
        let session = SessionIdentity::new();
        session.sign_in(User::new("u1", "Ada"));

        assert!(session.is_signed_in());
        assert_eq!(session.current_user().unwrap().id, "u1");

        let previous = session.sign_out();
        assert_eq!(previous.map(|u| u.id), Some("u1".to_string()));
        assert!(session.current_user().is_err());
        assert!(session.sign_out().is_none());
    }

    #[test]
    fn test_shared_session_sees_updates() {
        let session = Arc::new(SessionIdentity::signed_in(User::new("u1", "Ada")));
        let shared = Arc::clone(&session);

        session.sign_in(User::new("u2", "Bob"));
        assert_eq!(shared.current_user().unwrap().id, "u2");
    }
}
