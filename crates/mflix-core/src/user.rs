//! User types for MFlix.
//!
//! A user is identified by email. Preferences are an opaque JSON object owned
//! by the client; the data layer only ever replaces them wholesale.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::Email;

/// User preferences: string keys mapped to arbitrary JSON values.
pub type Preferences = serde_json::Map<String, serde_json::Value>;

/// A registered MFlix user, as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier. `None` until the user has been inserted.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Display name.
    pub name: String,

    /// Email address, unique across users.
    pub email: Email,

    /// Hashed password. Opaque to the data layer.
    #[serde(rename = "password")]
    pub hashed_password: String,

    /// Client preferences, if any have been set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl User {
    /// Create a new user without preferences.
    #[must_use]
    pub fn new(name: impl Into<String>, email: Email, hashed_password: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email,
            hashed_password: hashed_password.into(),
            preferences: None,
        }
    }

    /// Set the initial preferences.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Look up a single preference value.
    #[must_use]
    pub fn preference(&self, key: &str) -> Option<&serde_json::Value> {
        self.preferences.as_ref().and_then(|p| p.get(key))
    }
}
