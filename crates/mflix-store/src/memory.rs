//! In-memory storage implementation.
//!
//! Mirrors the `MongoStore` semantics without a database: a single lock
//! covers each check-and-write, so uniqueness holds under concurrent callers.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use mflix_core::{Email, ObjectId, Preferences, Session, User};

use crate::error::{Result, StoreError};
use crate::{Store, WriteAck};

#[derive(Debug, Default)]
struct Collections {
    users: BTreeMap<Email, User>,
    sessions: BTreeMap<Email, Session>,
}

/// In-memory store for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn user_count(&self) -> Result<usize> {
        Ok(self.lock()?.users.len())
    }

    /// Number of stored sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.sessions.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn ensure_indexes(&self) -> Result<()> {
        // Maps are keyed by the unique field already.
        Ok(())
    }

    fn insert_user(&self, user: &User) -> Result<WriteAck> {
        let mut collections = self.lock()?;
        if collections.users.contains_key(&user.email) {
            return Err(StoreError::DuplicateEntity(format!(
                "user with email {} already exists",
                user.email
            )));
        }

        let mut stored = user.clone();
        stored.id.get_or_insert_with(ObjectId::new);
        collections.users.insert(user.email.clone(), stored);

        Ok(WriteAck::acknowledged(1))
    }

    fn find_user(&self, email: &Email) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(email).cloned())
    }

    fn replace_preferences(&self, email: &Email, preferences: &Preferences) -> Result<WriteAck> {
        let mut collections = self.lock()?;
        let matched = match collections.users.get_mut(email) {
            Some(user) => {
                user.preferences = Some(preferences.clone());
                1
            }
            None => 0,
        };

        Ok(WriteAck::acknowledged(matched))
    }

    fn delete_user_record(&self, email: &Email) -> Result<WriteAck> {
        let removed = self.lock()?.users.remove(email);
        Ok(WriteAck::acknowledged(u64::from(removed.is_some())))
    }

    fn insert_session(&self, session: &Session) -> Result<WriteAck> {
        let mut collections = self.lock()?;
        if collections.sessions.contains_key(&session.user_id) {
            return Err(StoreError::DuplicateEntity(format!(
                "session for user with id {} already exists",
                session.user_id
            )));
        }

        let mut stored = session.clone();
        stored.id.get_or_insert_with(ObjectId::new);
        collections.sessions.insert(session.user_id.clone(), stored);

        Ok(WriteAck::acknowledged(1))
    }

    fn find_session(&self, user_id: &Email) -> Result<Option<Session>> {
        Ok(self.lock()?.sessions.get(user_id).cloned())
    }

    fn delete_sessions(&self, user_id: &Email) -> Result<WriteAck> {
        let removed = self.lock()?.sessions.remove(user_id);
        Ok(WriteAck::acknowledged(u64::from(removed.is_some())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        s.parse().unwrap()
    }

    #[test]
    fn insert_assigns_id() {
        let store = MemoryStore::new();
        let user = User::new("Jon Snow", email("jon@example.com"), "hashed");

        store.insert_user(&user).unwrap();

        let stored = store.find_user(&user.email).unwrap().unwrap();
        assert!(stored.id.is_some());
        assert_eq!(stored.name, "Jon Snow");
    }

    #[test]
    fn insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let user = User::new("Jon Snow", email("jon@example.com"), "hashed");
        store.insert_user(&user).unwrap();

        let result = store.insert_user(&user);
        assert!(matches!(result, Err(StoreError::DuplicateEntity(_))));
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn replace_preferences_reports_matches() {
        let store = MemoryStore::new();
        let prefs = Preferences::new();

        let ack = store
            .replace_preferences(&email("ghost@example.com"), &prefs)
            .unwrap();
        assert_eq!(ack, WriteAck::acknowledged(0));

        store
            .insert_user(&User::new("Jon", email("jon@example.com"), "h"))
            .unwrap();
        let ack = store
            .replace_preferences(&email("jon@example.com"), &prefs)
            .unwrap();
        assert_eq!(ack, WriteAck::acknowledged(1));
    }

    #[test]
    fn session_insert_is_conditional() {
        let store = MemoryStore::new();
        let owner = email("jon@example.com");

        store.insert_session(&Session::new(owner.clone(), "first")).unwrap();
        let result = store.insert_session(&Session::new(owner.clone(), "second"));

        assert!(matches!(result, Err(StoreError::DuplicateEntity(_))));
        assert_eq!(store.find_session(&owner).unwrap().unwrap().jwt, "first");
    }

    #[test]
    fn delete_sessions_without_match_is_acknowledged() {
        let store = MemoryStore::new();
        let ack = store.delete_sessions(&email("nobody@example.com")).unwrap();
        assert_eq!(ack, WriteAck::acknowledged(0));
    }
}
