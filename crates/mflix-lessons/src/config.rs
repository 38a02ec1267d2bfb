//! Lesson runner configuration.

use serde::Deserialize;
use std::path::Path;

use mflix_store::schema::collections;
use mflix_store::StoreConfig;

/// Default database name of the MFlix sample dataset.
pub const DEFAULT_DATABASE: &str = "sample_mflix";

/// Default collection holding the movie catalog.
pub const DEFAULT_MOVIES_COLLECTION: &str = collections::MOVIES;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting has no value.
    #[error("missing configuration: {0}")]
    Missing(&'static str),
}

/// Lesson runner configuration loaded from a secrets file or the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonsConfig {
    /// MongoDB connection string.
    pub db_uri: String,

    /// Database name (default: "`sample_mflix`").
    pub database: String,

    /// Movies collection name (default: "movies").
    pub movies_collection: String,
}

/// MongoDB secrets file structure.
#[derive(Debug, Deserialize)]
struct MongoSecrets {
    uri: String,
    #[serde(default)]
    database: Option<String>,
}

/// Secrets file locations, searched in order.
const SECRET_PATHS: [&str; 3] = [
    ".secrets/mongodb.json",
    "mflix/.secrets/mongodb.json",
    "../.secrets/mongodb.json",
];

impl LessonsConfig {
    /// Load configuration from the secrets file if present, otherwise from
    /// `MFLIX_DB_URI`, `MFLIX_NS` and `MFLIX_MOVIES_COLLECTION`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no connection string is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(&SECRET_PATHS, |key| std::env::var(key).ok())
    }

    fn resolve<P: AsRef<Path>>(
        secret_paths: &[P],
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (uri, database) = load_mongo_secrets(secret_paths, &var);

        Ok(Self {
            db_uri: uri.ok_or(ConfigError::Missing("MFLIX_DB_URI"))?,
            database: database.unwrap_or_else(|| DEFAULT_DATABASE.into()),
            movies_collection: var("MFLIX_MOVIES_COLLECTION")
                .unwrap_or_else(|| DEFAULT_MOVIES_COLLECTION.into()),
        })
    }

    /// Connection settings for the store.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.db_uri.clone(), self.database.clone())
    }
}

/// Load MongoDB secrets from the first readable file, or from `var`.
fn load_mongo_secrets<P: AsRef<Path>>(
    secret_paths: &[P],
    var: impl Fn(&str) -> Option<String>,
) -> (Option<String>, Option<String>) {
    for path in secret_paths {
        let path = path.as_ref();
        if let Ok(secrets) = load_secrets_file::<MongoSecrets>(path) {
            tracing::info!(path = %path.display(), "Loaded MongoDB secrets from file");
            return (
                Some(secrets.uri),
                secrets.database.or_else(|| var("MFLIX_NS")),
            );
        }
    }

    // Fall back to environment variables
    tracing::debug!("MongoDB secrets file not found, using environment variables");
    (var("MFLIX_DB_URI"), var("MFLIX_NS"))
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<T, std::io::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
