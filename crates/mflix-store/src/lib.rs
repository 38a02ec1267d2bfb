//! Storage layer for MFlix users and sessions.
//!
//! This crate provides the data access object for the `users` and `sessions`
//! collections, the backends it runs on, and builders for aggregation
//! pipelines that run on the database.
//!
//! # Architecture
//!
//! - [`Store`]: one database round trip per method, with uniqueness enforced
//!   by the backend as an atomic conditional write.
//! - [`UserDao`]: the operations callers use. Validates input, sequences the
//!   cascading user delete, and logs outcomes.
//! - [`MongoStore`]: MongoDB backend with unique indexes on `users.email` and
//!   `sessions.user_id`.
//! - [`MemoryStore`]: in-process backend with the same semantics.
//!
//! # Example
//!
//! ```no_run
//! use mflix_store::{MongoStore, StoreConfig, UserDao};
//! use mflix_core::User;
//!
//! let config = StoreConfig::new("mongodb://localhost:27017", "sample_mflix");
//! let dao = UserDao::new(MongoStore::connect(&config).unwrap());
//!
//! let user = User::new("Ned Stark", "ned@example.com".parse().unwrap(), "hashed");
//! dao.add_user(&user).unwrap();
//!
//! let retrieved = dao.get_user(&user.email).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dao;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod pipeline;
pub mod schema;

pub use dao::UserDao;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use mongo::{MongoStore, StoreConfig};
pub use pipeline::{Facet, Pipeline, Stage};

use mflix_core::{Email, Preferences, Session, User};

/// Outcome of a write as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAck {
    /// Whether the store confirmed the write.
    pub acknowledged: bool,

    /// Number of records matched by the write. Zero when unacknowledged.
    pub affected: u64,
}

impl WriteAck {
    /// An acknowledged write that touched `affected` records.
    #[must_use]
    pub const fn acknowledged(affected: u64) -> Self {
        Self {
            acknowledged: true,
            affected,
        }
    }

    /// A write the store did not confirm.
    #[must_use]
    pub const fn unacknowledged() -> Self {
        Self {
            acknowledged: false,
            affected: 0,
        }
    }
}

/// The storage trait defining all database operations on users and sessions.
///
/// Each method is a single call into the backend. Implementations must make
/// the uniqueness checks of `insert_user` and `insert_session` atomic with the
/// write itself.
pub trait Store: Send + Sync {
    /// Create the unique indexes the other operations rely on.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn ensure_indexes(&self) -> Result<()>;

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateEntity` if a user with the same email exists.
    /// - `StoreError::OperationFailed` if the store rejects the write.
    fn insert_user(&self, user: &User) -> Result<WriteAck>;

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_user(&self, email: &Email) -> Result<Option<User>>;

    /// Replace the preferences of the user with `email`.
    ///
    /// `affected` is the number of users matched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OperationFailed` if the store rejects the write.
    fn replace_preferences(&self, email: &Email, preferences: &Preferences) -> Result<WriteAck>;

    /// Delete the user record with `email`. Sessions are not touched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OperationFailed` if the store rejects the write.
    fn delete_user_record(&self, email: &Email) -> Result<WriteAck>;

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Insert a session unless one already exists for its user.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateEntity` if the user already has a session.
    /// - `StoreError::OperationFailed` if the store rejects the write.
    fn insert_session(&self, session: &Session) -> Result<WriteAck>;

    /// Get the session of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_session(&self, user_id: &Email) -> Result<Option<Session>>;

    /// Delete every session of a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OperationFailed` if the store rejects the write.
    fn delete_sessions(&self, user_id: &Email) -> Result<WriteAck>;
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn ensure_indexes(&self) -> Result<()> {
        (**self).ensure_indexes()
    }

    fn insert_user(&self, user: &User) -> Result<WriteAck> {
        (**self).insert_user(user)
    }

    fn find_user(&self, email: &Email) -> Result<Option<User>> {
        (**self).find_user(email)
    }

    fn replace_preferences(&self, email: &Email, preferences: &Preferences) -> Result<WriteAck> {
        (**self).replace_preferences(email, preferences)
    }

    fn delete_user_record(&self, email: &Email) -> Result<WriteAck> {
        (**self).delete_user_record(email)
    }

    fn insert_session(&self, session: &Session) -> Result<WriteAck> {
        (**self).insert_session(session)
    }

    fn find_session(&self, user_id: &Email) -> Result<Option<Session>> {
        (**self).find_session(user_id)
    }

    fn delete_sessions(&self, user_id: &Email) -> Result<WriteAck> {
        (**self).delete_sessions(user_id)
    }
}
