//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `thumbs_up_test`)
//!   `TEST_DB_PASSWORD` (default: `thumbs_up_test`)
//!   `TEST_DB_NAME` (default: `thumbs_up_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use sea_orm::ConnectionTrait;
use thumbs_up_common::AppError;
use thumbs_up_db::{
    PolymorphicRef, VoteFilter, VoteRepository,
    test_utils::{TestDatabase, TestDbConfig},
};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_votes_table_exists() {
    let db = TestDatabase::new().await.unwrap();
    let result = db
        .connection()
        .execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM \"votes\"".to_string(),
        ))
        .await;
    assert!(result.is_ok(), "Query failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_cast_and_count() {
    let db = TestDatabase::create_unique().await.unwrap();
    let repo = VoteRepository::new(Arc::clone(&db.conn));
    let item = PolymorphicRef::new("Item", 1);

    for id in 1..=3 {
        let voter = PolymorphicRef::new("User", id);
        repo.cast(Some(&voter), &item, id != 3).await.unwrap();
    }

    let stats = repo.stats_for_voteable(&item).await.unwrap();
    assert_eq!(stats.votes_for, 2);
    assert_eq!(stats.votes_against, 1);
    assert_eq!(
        repo.count_for_voteable(&item, VoteFilter::Against)
            .await
            .unwrap(),
        1
    );

    drop(repo);
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unique_index_rejects_second_vote() {
    let db = TestDatabase::create_unique().await.unwrap();
    let repo = VoteRepository::new(Arc::clone(&db.conn));
    let voter = PolymorphicRef::new("User", 1);
    let item = PolymorphicRef::new("Item", 1);

    repo.cast(Some(&voter), &item, true).await.unwrap();
    let err = repo.cast(Some(&voter), &item, false).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    drop(repo);
    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
