//! Login sessions.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::Email;

/// A login session, as stored in the `sessions` collection.
///
/// There is at most one session per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Store-assigned identifier.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// The owning user's email.
    pub user_id: Email,

    /// Opaque session token.
    pub jwt: String,
}

impl Session {
    /// Create a session for `user_id` holding `jwt`.
    #[must_use]
    pub fn new(user_id: Email, jwt: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id,
            jwt: jwt.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_document_shape() {
        let session = Session::new("sansa@example.com".parse().unwrap(), "token-1");
        let doc = bson::to_document(&session).unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get_str("user_id").unwrap(), "sansa@example.com");
        assert_eq!(doc.get_str("jwt").unwrap(), "token-1");
    }

    #[test]
    fn session_reads_stored_id() {
        let oid = ObjectId::new();
        let doc = bson::doc! { "_id": oid, "user_id": "sansa@example.com", "jwt": "t" };
        let session: Session = bson::from_document(doc).unwrap();
        assert_eq!(session.id, Some(oid));
    }
}
