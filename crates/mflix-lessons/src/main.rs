//! MFlix Lessons - aggregation builders against the movie catalog
//!
//! Connects to the configured database and runs each lesson.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mflix_lessons::{lessons, LessonsConfig};
use mflix_store::MongoStore;

const COUNTRY: &str = "Portugal";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mflix=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MFlix lessons");

    let config = LessonsConfig::from_env()?;

    tracing::info!(
        database = %config.database,
        movies_collection = %config.movies_collection,
        "Configuration loaded"
    );

    let store = MongoStore::connect(&config.store_config())?;

    let count = lessons::count_movies_from(&store, &config.movies_collection, COUNTRY)?;
    tracing::info!(country = COUNTRY, count, "Single-stage aggregation");

    let facets = lessons::facets_of(&store, &config.movies_collection, COUNTRY)?;
    for doc in &facets {
        tracing::info!(country = COUNTRY, %doc, "Facet document");
    }
    tracing::info!(documents = facets.len(), "Facet aggregation");

    Ok(())
}
