//! Database layer for thumbs-up: the `votes` table, its migrations, and the
//! polymorphic queries run against it.

pub mod entities;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;
pub mod migrations;
pub mod polymorphic;
pub mod queries;
pub mod repositories;
pub mod test_utils;

pub use polymorphic::{PolymorphicRef, VoteFilter, Voteable, Voter};
pub use queries::{
    PlusminusTallyOptions, PlusminusTallyQuery, PlusminusTallyRow, TallyOptions, TallyQuery,
    TallyRow, voted_on_by,
};
pub use repositories::{OwnedVoteables, VoteRepository};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use thumbs_up_common::{AppError, Config};
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    tracing::info!(
        max_connections = config.database.max_connections,
        "Connecting to database"
    );
    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
///
/// With `unique_votes` disabled the one-vote-per-voter index is left out.
pub async fn migrate(db: &DatabaseConnection, config: &Config) -> Result<(), AppError> {
    let result = if config.voting.unique_votes {
        migrations::Migrator::up(db, None).await
    } else {
        migrations::MultipleVotesMigrator::up(db, None).await
    };
    result.map_err(|e| AppError::Database(e.to_string()))
}
