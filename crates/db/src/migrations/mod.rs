//! Database migrations.
//!
//! Schema migrations for the vote table.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_vote_table;
mod m20250101_000002_add_one_vote_per_voter_index;

/// Creates the vote table and the one-vote-per-voter unique index.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_vote_table::Migration),
            Box::new(m20250101_000002_add_one_vote_per_voter_index::Migration),
        ]
    }
}

/// Creates the vote table only, for hosts that allow several votes per
/// voter on the same voteable.
pub struct MultipleVotesMigrator;

#[async_trait::async_trait]
impl MigratorTrait for MultipleVotesMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_vote_table::Migration)]
    }
}
