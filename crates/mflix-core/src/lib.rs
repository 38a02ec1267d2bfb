//! Core types for the MFlix data access layer.
//!
//! This crate provides the domain types shared by the store and its callers:
//!
//! - **Identifiers**: `Email`, the business key of a user
//! - **Users**: `User`, `Preferences`
//! - **Sessions**: `Session`
//!
//! # Document mapping
//!
//! Types serialize to the document shapes of the `users` and `sessions`
//! collections. The store-assigned `_id` is optional on the client side and
//! omitted when unset so the database assigns it on insert.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod session;
pub mod user;

pub use bson::oid::ObjectId;
pub use ids::{Email, IdError};
pub use session::Session;
pub use user::{Preferences, User};
