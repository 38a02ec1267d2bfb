//! MFlix aggregation lessons.
//!
//! This crate runs aggregation pipelines built with the `mflix-store` stage
//! builders against the movie catalog:
//!
//! - Single-stage `$match` of movies by country
//! - `$facet` over the matched movies: cast members, genre counts, year buckets
//!
//! # Configuration
//!
//! The connection string and database name come from `.secrets/mongodb.json`
//! or the `MFLIX_DB_URI` and `MFLIX_NS` environment variables.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod lessons;

pub use config::{ConfigError, LessonsConfig};
