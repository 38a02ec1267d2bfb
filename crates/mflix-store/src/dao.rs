//! User and session data access.
//!
//! `UserDao` is the entry point callers use. It validates arguments, runs the
//! cascading user delete as an explicit two-step operation, and logs every
//! outcome. Uniqueness is left to the backend's conditional writes.

use mflix_core::{Email, Session, User};

use crate::error::{Result, StoreError};
use crate::Store;

/// Data access object for the `users` and `sessions` collections.
#[derive(Debug, Clone)]
pub struct UserDao<S> {
    store: S,
}

impl<S: Store> UserDao<S> {
    /// Create a DAO over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert `user` into the `users` collection.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateEntity` if a user with the same email exists.
    /// - `StoreError::OperationFailed` if the store rejects the write.
    pub fn add_user(&self, user: &User) -> Result<()> {
        self.store.insert_user(user).inspect_failure("add_user")?;
        tracing::info!(email = %user.email, "User added");
        Ok(())
    }

    /// Create a session for `user_id` holding `jwt`.
    ///
    /// An existing session is never replaced.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateEntity` if the user already has a session.
    /// - `StoreError::OperationFailed` if the store rejects the write.
    pub fn create_session(&self, user_id: &Email, jwt: &str) -> Result<()> {
        self.store
            .insert_session(&Session::new(user_id.clone(), jwt))
            .inspect_failure("create_session")?;
        tracing::info!(user_id = %user_id, "User session created");
        Ok(())
    }

    /// Get the user with `email`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, email: &Email) -> Result<Option<User>> {
        self.store.find_user(email)
    }

    /// Get the session of `user_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_session(&self, user_id: &Email) -> Result<Option<Session>> {
        self.store.find_session(user_id)
    }

    /// Delete every session of `user_id`.
    ///
    /// Returns whether the store acknowledged the deletion. Deleting zero
    /// sessions is still an acknowledged deletion.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OperationFailed` if the store rejects the write.
    pub fn delete_user_sessions(&self, user_id: &Email) -> Result<bool> {
        let ack = self
            .store
            .delete_sessions(user_id)
            .inspect_failure("delete_user_sessions")?;
        tracing::debug!(user_id = %user_id, deleted = ack.affected, "User sessions deleted");
        Ok(ack.acknowledged)
    }

    /// Delete the user with `email` and its sessions.
    ///
    /// Sessions are deleted first. If that deletion is not acknowledged the
    /// user record is left in place and `Ok(false)` is returned. Otherwise
    /// returns whether the user deletion was acknowledged.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no user has `email`. Nothing is written.
    /// - `StoreError::OperationFailed` if the store rejects a write.
    pub fn delete_user(&self, email: &Email) -> Result<bool> {
        if self.store.find_user(email)?.is_none() {
            let e = StoreError::NotFound(format!("user with email {email} doesn't exist"));
            log_rejection("delete_user", &e);
            return Err(e);
        }

        if !self.delete_user_sessions(email)? {
            tracing::warn!(email = %email, "Session deletion not acknowledged, keeping user");
            return Ok(false);
        }

        let ack = self.store.delete_user_record(email).inspect_failure("delete_user")?;
        tracing::info!(email = %email, "User deleted");
        Ok(ack.acknowledged)
    }

    /// Replace the preferences of the user with `email`.
    ///
    /// `preferences` must be a JSON object and replaces the stored value
    /// wholesale; keys absent from it are dropped.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidArgument` if `preferences` is `null` or not an
    ///   object. Checked before the user is looked up.
    /// - `StoreError::NotFound` if no user has `email`.
    /// - `StoreError::OperationFailed` if the store rejects the write.
    pub fn update_user_preferences(
        &self,
        email: &Email,
        preferences: &serde_json::Value,
    ) -> Result<()> {
        let preferences = match preferences {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => {
                return Err(StoreError::InvalidArgument(
                    "user preferences should not be null".into(),
                ));
            }
            _ => {
                return Err(StoreError::InvalidArgument(
                    "user preferences must be an object".into(),
                ));
            }
        };

        let ack = self
            .store
            .replace_preferences(email, preferences)
            .inspect_failure("update_user_preferences")?;

        if ack.acknowledged && ack.affected == 0 {
            let e = StoreError::NotFound(format!("user with email {email} doesn't exist"));
            log_rejection("update_user_preferences", &e);
            return Err(e);
        }

        tracing::info!(email = %email, "User preferences updated");
        Ok(())
    }
}

fn log_rejection(operation: &'static str, e: &StoreError) {
    match e {
        StoreError::DuplicateEntity(_)
        | StoreError::NotFound(_)
        | StoreError::InvalidArgument(_) => {
            tracing::warn!(operation, error = %e, "Operation rejected");
        }
        _ => tracing::error!(operation, error = %e, "Operation failed"),
    }
}

trait InspectFailure {
    fn inspect_failure(self, operation: &'static str) -> Self;
}

impl<T> InspectFailure for Result<T> {
    fn inspect_failure(self, operation: &'static str) -> Self {
        if let Err(e) = &self {
            log_rejection(operation, e);
        }
        self
    }
}
