//! MongoDB storage implementation.
//!
//! This module provides the `MongoStore` implementation of the `Store` trait
//! on top of the synchronous driver API.

use bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{Acknowledgment, IndexOptions, UpdateOptions, WriteConcern};
use mongodb::sync::{Client, Collection, Database};
use mongodb::IndexModel;

use mflix_core::{Email, Preferences, Session, User};

use crate::error::{Result, StoreError};
use crate::pipeline::Pipeline;
use crate::schema::{collections, DUPLICATE_KEY_CODE};
use crate::{Store, WriteAck};

/// Connection settings for [`MongoStore::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// MongoDB connection string.
    pub uri: String,

    /// Name of the MFlix database.
    pub database: String,
}

impl StoreConfig {
    /// Create a config from a connection string and database name.
    #[must_use]
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
        }
    }
}

/// MongoDB-backed storage implementation.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
    users: Collection<User>,
    sessions: Collection<Session>,
    acknowledged_writes: bool,
}

impl MongoStore {
    /// Create a store over `database` using an existing client and ensure
    /// the unique indexes on `users.email` and `sessions.user_id`.
    ///
    /// The client is a pooled handle and may be shared with other stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the indexes cannot be created.
    pub fn new(client: &Client, database: &str) -> Result<Self> {
        let db = client.database(database);
        let users = db.collection::<User>(collections::USERS);
        let sessions = db.collection::<Session>(collections::SESSIONS);
        let acknowledged_writes = is_acknowledged(db.write_concern());

        let store = Self {
            db,
            users,
            sessions,
            acknowledged_writes,
        };
        store.ensure_indexes()?;
        Ok(store)
    }

    /// Connect to the database described by `config` and ensure indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the indexes
    /// cannot be created.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        tracing::debug!(database = %config.database, "Connecting to MongoDB");
        let client = Client::with_uri_str(&config.uri).map_err(database_error)?;
        Self::new(&client, &config.database)
    }

    /// The underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Submit `pipeline` to the database for execution against `collection`.
    ///
    /// Results are streamed lazily from the server cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the pipeline. Errors while
    /// iterating are yielded by the iterator.
    pub fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<impl Iterator<Item = Result<Document>>> {
        tracing::debug!(collection, stages = pipeline.len(), "Running aggregation");
        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(pipeline.to_documents(), None)
            .map_err(database_error)?;

        Ok(cursor.map(|item| item.map_err(database_error)))
    }

    fn ack(&self, affected: u64) -> WriteAck {
        if self.acknowledged_writes {
            WriteAck::acknowledged(affected)
        } else {
            WriteAck::unacknowledged()
        }
    }
}

impl Store for MongoStore {
    fn ensure_indexes(&self) -> Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .map_err(database_error)?;

        self.sessions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .map_err(database_error)?;

        Ok(())
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    fn insert_user(&self, user: &User) -> Result<WriteAck> {
        self.users.insert_one(user, None).map_err(|e| {
            write_error(e, || format!("user with email {} already exists", user.email))
        })?;

        Ok(self.ack(1))
    }

    fn find_user(&self, email: &Email) -> Result<Option<User>> {
        self.users
            .find_one(doc! { "email": email.as_str() }, None)
            .map_err(database_error)
    }

    fn replace_preferences(&self, email: &Email, preferences: &Preferences) -> Result<WriteAck> {
        let update = doc! { "$set": { "preferences": bson::to_bson(preferences)? } };

        let result = self
            .users
            .update_one(doc! { "email": email.as_str() }, update, None)
            .map_err(|e| write_error(e, || format!("preferences of {email}")))?;

        Ok(self.ack(result.matched_count))
    }

    fn delete_user_record(&self, email: &Email) -> Result<WriteAck> {
        let result = self
            .users
            .delete_one(doc! { "email": email.as_str() }, None)
            .map_err(|e| write_error(e, || format!("user {email}")))?;

        Ok(self.ack(result.deleted_count))
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    fn insert_session(&self, session: &Session) -> Result<WriteAck> {
        let duplicate = || format!("session for user with id {} already exists", session.user_id);

        // $setOnInsert leaves an existing session untouched; a match without an
        // upsert means the user already had one.
        let filter = doc! { "user_id": session.user_id.as_str() };
        let update = doc! { "$setOnInsert": { "jwt": session.jwt.as_str() } };
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .sessions
            .update_one(filter, update, options)
            .map_err(|e| write_error(e, duplicate))?;

        upsert_outcome(self.ack(1), result.upserted_id.is_some(), duplicate)
    }

    fn find_session(&self, user_id: &Email) -> Result<Option<Session>> {
        self.sessions
            .find_one(doc! { "user_id": user_id.as_str() }, None)
            .map_err(database_error)
    }

    fn delete_sessions(&self, user_id: &Email) -> Result<WriteAck> {
        let result = self
            .sessions
            .delete_many(doc! { "user_id": user_id.as_str() }, None)
            .map_err(|e| write_error(e, || format!("sessions of {user_id}")))?;

        Ok(self.ack(result.deleted_count))
    }
}

/// Whether writes under `concern` are confirmed by the server.
fn is_acknowledged(concern: Option<&WriteConcern>) -> bool {
    !matches!(
        concern.and_then(|wc| wc.w.as_ref()),
        Some(Acknowledgment::Nodes(0))
    )
}

/// An acknowledged upsert that inserted nothing matched an existing document.
fn upsert_outcome(
    ack: WriteAck,
    inserted: bool,
    duplicate: impl FnOnce() -> String,
) -> Result<WriteAck> {
    if ack.acknowledged && !inserted {
        return Err(StoreError::DuplicateEntity(duplicate()));
    }
    Ok(ack)
}

fn database_error(e: MongoError) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Translate a failed write. Duplicate key violations become
/// `DuplicateEntity` described by `duplicate`; every other rejected write is
/// `OperationFailed` carrying the server message.
fn write_error(e: MongoError, duplicate: impl FnOnce() -> String) -> StoreError {
    let translated = match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY_CODE => {
            tracing::warn!(code = we.code, "Duplicate key on write");
            Some(StoreError::DuplicateEntity(duplicate()))
        }
        ErrorKind::Write(WriteFailure::WriteError(we)) => {
            tracing::error!(code = we.code, message = %we.message, "Write rejected");
            Some(StoreError::OperationFailed(we.message.clone()))
        }
        ErrorKind::Write(WriteFailure::WriteConcernError(wce)) => {
            tracing::error!(code = wce.code, message = %wce.message, "Write concern failed");
            Some(StoreError::OperationFailed(wce.message.clone()))
        }
        _ => None,
    };

    translated.unwrap_or_else(|| database_error(e))
}
