//! Live MongoDB integration tests.
//!
//! These tests run against a real MongoDB deployment.
//! Set the `MFLIX_TEST_DB_URI` environment variable to its connection string.
//!
//! Run with: cargo test --test live_mongo -- --nocapture --ignored

use mongodb::sync::Client;
use serde_json::json;
use uuid::Uuid;

use mflix_core::{Email, User};
use mflix_store::pipeline::{filters, Pipeline, Stage};
use mflix_store::{MongoStore, StoreConfig, StoreError, UserDao};

fn test_config() -> StoreConfig {
    let uri = std::env::var("MFLIX_TEST_DB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    StoreConfig::new(uri, "mflix_live_tests")
}

fn connect() -> UserDao<MongoStore> {
    UserDao::new(MongoStore::connect(&test_config()).expect("Failed to connect to MongoDB"))
}

fn generate_test_email() -> Email {
    format!("live-{}@example.com", Uuid::new_v4())
        .parse()
        .expect("valid email")
}

// ============================================================================
// Users and sessions
// ============================================================================

#[test]
#[ignore] // Run with --ignored flag
fn live_user_lifecycle() {
    let dao = connect();
    let email = generate_test_email();
    let user = User::new("Live Test", email.clone(), "hashed");

    dao.add_user(&user).expect("add_user failed");
    let stored = dao.get_user(&email).unwrap().expect("user not found");
    assert!(stored.id.is_some(), "Expected a store-assigned _id");

    let duplicate = dao.add_user(&user);
    assert!(
        matches!(duplicate, Err(StoreError::DuplicateEntity(_))),
        "Expected unique index on users.email, got {duplicate:?}"
    );

    dao.update_user_preferences(&email, &json!({ "theme": "dark" }))
        .unwrap();
    dao.update_user_preferences(&email, &json!({ "lang": "en" }))
        .unwrap();
    let stored = dao.get_user(&email).unwrap().unwrap();
    assert_eq!(
        serde_json::Value::Object(stored.preferences.unwrap()),
        json!({ "lang": "en" })
    );

    dao.create_session(&email, "live-jwt").unwrap();
    let again = dao.create_session(&email, "other-jwt");
    assert!(matches!(again, Err(StoreError::DuplicateEntity(_))));
    assert_eq!(dao.get_session(&email).unwrap().unwrap().jwt, "live-jwt");

    assert!(dao.delete_user(&email).unwrap());
    assert!(dao.get_user(&email).unwrap().is_none());
    assert!(dao.get_session(&email).unwrap().is_none());
}

#[test]
#[ignore]
fn live_store_from_client_rejects_duplicate_email() {
    let config = test_config();
    let client = Client::with_uri_str(&config.uri).expect("Failed to create client");
    let database = format!("mflix_fresh_{}", Uuid::new_v4().simple());
    let dao = UserDao::new(MongoStore::new(&client, &database).expect("Failed to create store"));

    let user = User::new("Fresh Store", generate_test_email(), "hashed");
    dao.add_user(&user).unwrap();
    let duplicate = dao.add_user(&user);

    client.database(&database).drop(None).unwrap();
    assert!(
        matches!(duplicate, Err(StoreError::DuplicateEntity(_))),
        "Expected unique index on a freshly created store, got {duplicate:?}"
    );
}

#[test]
#[ignore]
fn live_delete_unknown_user_is_not_found() {
    let dao = connect();
    let result = dao.delete_user(&generate_test_email());
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
#[ignore]
fn live_aggregate_runs_on_server() {
    let dao = connect();
    let email = generate_test_email();
    dao.add_user(&User::new("Aggregate", email.clone(), "hashed"))
        .unwrap();

    let pipeline = Pipeline::new().push(Stage::match_(filters::eq("email", email.as_str())));
    let docs: Vec<_> = dao
        .store()
        .aggregate("users", &pipeline)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    println!("Aggregated: {docs:?}");
    assert_eq!(docs.len(), 1);

    dao.delete_user(&email).unwrap();
}
