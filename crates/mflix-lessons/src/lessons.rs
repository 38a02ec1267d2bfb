//! Aggregation lessons over the movie catalog.
//!
//! Each lesson builds its pipeline with the stage builders and hands the whole
//! sequence to the database. Grouping, bucketing and faceting all run there.

use bson::Document;

use mflix_store::pipeline::{accumulators, filters, Facet, Pipeline, Stage};
use mflix_store::{MongoStore, Result};

/// Facet listing the distinct cast members of the matched movies.
pub const CAST_MEMBERS: &str = "cast_members";

/// Facet counting matched movies per genre, most frequent first.
pub const GENRES_COUNT: &str = "genres_count";

/// Facet bucketing matched movies by year.
pub const YEAR_BUCKET: &str = "year_bucket";

/// Number of year ranges in the year facet.
pub const YEAR_BUCKETS: i32 = 10;

/// Movies produced in `country`:
///
/// `[{ $match: { countries: <country> } }]`
#[must_use]
pub fn single_stage(country: &str) -> Pipeline {
    Pipeline::new().push(Stage::match_(filters::eq("countries", country)))
}

/// Facets of the movies produced in `country`: cast members, genre counts and
/// year buckets, merged into a single output document.
#[must_use]
pub fn country_facets(country: &str) -> Pipeline {
    let cast_members = Facet::new(
        CAST_MEMBERS,
        [
            Stage::unwind("$cast"),
            Stage::group("", [accumulators::add_to_set("cast_list", "$cast")]),
        ],
    );

    let genres_count = Facet::new(
        GENRES_COUNT,
        [Stage::unwind("$genres"), Stage::sort_by_count("$genres")],
    );

    let year_bucket = Facet::new(YEAR_BUCKET, [Stage::bucket_auto("$year", YEAR_BUCKETS)]);

    Pipeline::new()
        .push(Stage::match_(filters::eq("countries", country)))
        .push(Stage::facet([cast_members, genres_count, year_bucket]))
}

/// Run [`single_stage`] and return the number of matching movies.
///
/// # Errors
///
/// Returns an error if the database rejects the pipeline or the cursor fails.
pub fn count_movies_from(store: &MongoStore, collection: &str, country: &str) -> Result<usize> {
    let mut count = 0;
    for doc in store.aggregate(collection, &single_stage(country))? {
        doc?;
        count += 1;
    }
    Ok(count)
}

/// Run [`country_facets`] and collect the output documents.
///
/// A `$facet` stage produces exactly one document.
///
/// # Errors
///
/// Returns an error if the database rejects the pipeline or the cursor fails.
pub fn facets_of(store: &MongoStore, collection: &str, country: &str) -> Result<Vec<Document>> {
    store
        .aggregate(collection, &country_facets(country))?
        .collect()
}
