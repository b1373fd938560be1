//! Add the one-vote-per-voter unique index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEX_NAME: &str = "fk_one_vote_per_user_per_entity";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name(INDEX_NAME)
                    .table(Votes::Table)
                    .col(Votes::VoterId)
                    .col(Votes::VoterType)
                    .col(Votes::VoteableId)
                    .col(Votes::VoteableType)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(INDEX_NAME)
                    .table(Votes::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Votes {
    Table,
    VoterId,
    VoterType,
    VoteableId,
    VoteableType,
}
