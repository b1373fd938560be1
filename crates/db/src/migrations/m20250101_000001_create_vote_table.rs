//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Votes::Vote)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Votes::VoteableType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Votes::VoteableId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::VoterType).string_len(255).null())
                    .col(ColumnDef::new(Votes::VoterId).big_integer().null())
                    .col(
                        ColumnDef::new(Votes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Votes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (voter_id, voter_type) for a voter's votes
        manager
            .create_index(
                Index::create()
                    .name("idx_votes_voter")
                    .table(Votes::Table)
                    .col(Votes::VoterId)
                    .col(Votes::VoterType)
                    .to_owned(),
            )
            .await?;

        // Index: (voteable_id, voteable_type) for a voteable's votes and tallies
        manager
            .create_index(
                Index::create()
                    .name("idx_votes_voteable")
                    .table(Votes::Table)
                    .col(Votes::VoteableId)
                    .col(Votes::VoteableType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Votes {
    Table,
    Id,
    Vote,
    VoteableType,
    VoteableId,
    VoterType,
    VoterId,
    CreatedAt,
    UpdatedAt,
}
