//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use crate::polymorphic::{PolymorphicRef, VoteFilter, Voteable, Voter};
use crate::queries::{db_err, direction_sum};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityName, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Select, Set, TransactionTrait,
    prelude::DateTimeWithTimeZone,
    sea_query::{Alias, DynIden, Expr, IntoIden},
};
use thumbs_up_common::{AppError, AppResult, VoteStats};

/// Up / down sums of an aggregate vote query.
#[derive(Debug, FromQueryResult)]
struct DirectionCounts {
    up: Option<i64>,
    down: Option<i64>,
}

impl From<DirectionCounts> for VoteStats {
    fn from(counts: DirectionCounts) -> Self {
        let as_count = |v: Option<i64>| v.and_then(|v| u64::try_from(v).ok()).unwrap_or(0);
        Self::new(as_count(counts.up), as_count(counts.down))
    }
}

#[derive(Debug, FromQueryResult)]
struct VoterRow {
    voter_type: String,
    voter_id: i64,
}

/// Voteables of one type owned by a record, e.g. the items a user created.
#[derive(Debug, Clone)]
pub struct OwnedVoteables {
    voteable_type: &'static str,
    table: DynIden,
    id_column: (DynIden, DynIden),
    owner_column: (DynIden, DynIden),
}

impl OwnedVoteables {
    /// Voteables of type `E` whose `owner_column` holds the owner's id.
    #[must_use]
    pub fn of<E: Voteable>(owner_column: E::Column) -> Self {
        Self {
            voteable_type: E::VOTEABLE_TYPE,
            table: E::default().into_iden(),
            id_column: E::voteable_id_column().as_column_ref(),
            owner_column: owner_column.as_column_ref(),
        }
    }

    /// Type tag of the owned voteables.
    #[must_use]
    pub const fn voteable_type(&self) -> &'static str {
        self.voteable_type
    }
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The underlying connection, for running query builders.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<vote::Model>> {
        Vote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find the earliest vote cast by a voter on a voteable.
    pub async fn find_by_voter_and_voteable(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(voter.as_voter())
            .filter(voteable.as_voteable())
            .order_by_asc(vote::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Check if a voter has voted on a voteable, optionally in one direction.
    pub async fn has_voted(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
        filter: VoteFilter,
    ) -> AppResult<bool> {
        let count = Self::directed(Vote::find(), filter)
            .filter(voter.as_voter())
            .filter(voteable.as_voteable())
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Create a new vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Record a vote by `voter` (if any) on `voteable`.
    pub async fn cast(
        &self,
        voter: Option<&PolymorphicRef>,
        voteable: &PolymorphicRef,
        direction: bool,
    ) -> AppResult<vote::Model> {
        self.create(Self::new_vote(voter, voteable, direction)).await
    }

    /// Replace every vote `voter` cast on `voteable` with one new vote.
    ///
    /// The delete and the insert share a transaction: if the insert fails
    /// the earlier votes are kept. Returns the number of votes removed and
    /// the new vote.
    pub async fn replace(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
        direction: bool,
    ) -> AppResult<(u64, vote::Model)> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = Vote::delete_many()
            .filter(voter.as_voter())
            .filter(voteable.as_voteable())
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        let created = Self::new_vote(Some(voter), voteable, direction)
            .insert(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok((removed, created))
    }

    /// Bump a vote's `updated_at`.
    pub async fn touch(&self, id: i32) -> AppResult<()> {
        let result = Vote::update_many()
            .col_expr(vote::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(vote::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Vote not found: {id}")));
        }
        Ok(())
    }

    /// Delete every vote cast by a voter on a voteable.
    pub async fn delete_by_voter_and_voteable(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(voter.as_voter())
            .filter(voteable.as_voteable())
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Count votes on a voteable.
    pub async fn count_for_voteable(
        &self,
        voteable: &PolymorphicRef,
        filter: VoteFilter,
    ) -> AppResult<u64> {
        Self::directed(Vote::find(), filter)
            .filter(voteable.as_voteable())
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count votes cast by a voter.
    pub async fn count_for_voter(
        &self,
        voter: &PolymorphicRef,
        filter: VoteFilter,
    ) -> AppResult<u64> {
        Self::directed(Vote::find(), filter)
            .filter(voter.as_voter())
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Up and down counts of a voteable in one query.
    pub async fn stats_for_voteable(&self, voteable: &PolymorphicRef) -> AppResult<VoteStats> {
        let votes = Alias::new(Vote.table_name());
        let counts = Vote::find()
            .select_only()
            .column_as(direction_sum(&votes, 1, 0), "up")
            .column_as(direction_sum(&votes, 0, 1), "down")
            .filter(voteable.as_voteable())
            .into_model::<DirectionCounts>()
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(counts.map(VoteStats::from).unwrap_or_default())
    }

    /// Distinct voters of a voteable. Votes without a voter are skipped.
    pub async fn distinct_voters(
        &self,
        voteable: &PolymorphicRef,
        filter: VoteFilter,
    ) -> AppResult<Vec<PolymorphicRef>> {
        let rows = Self::directed(Vote::find(), filter)
            .select_only()
            .column(vote::Column::VoterType)
            .column(vote::Column::VoterId)
            .distinct()
            .filter(voteable.as_voteable())
            .filter(vote::Column::VoterType.is_not_null())
            .filter(vote::Column::VoterId.is_not_null())
            .into_model::<VoterRow>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| PolymorphicRef::new(row.voter_type, row.voter_id))
            .collect())
    }

    /// Votes on a voteable, newest first.
    pub async fn find_for_voteable(
        &self,
        voteable: &PolymorphicRef,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(voteable.as_voteable())
            .order_by_desc(vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Votes cast by a voter, newest first.
    pub async fn find_for_voter(&self, voter: &PolymorphicRef) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(voter.as_voter())
            .order_by_desc(vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Votes created after `since`, newest first.
    pub async fn find_recent(&self, since: DateTimeWithTimeZone) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::CreatedAt.gt(since))
            .order_by_desc(vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Up and down votes received by the voteables an owner holds.
    pub async fn stats_for_owner(
        &self,
        owned: &OwnedVoteables,
        owner_id: i64,
    ) -> AppResult<VoteStats> {
        let votes = Alias::new(Vote.table_name());
        let mut select = Vote::find()
            .select_only()
            .column_as(direction_sum(&votes, 1, 0), "up")
            .column_as(direction_sum(&votes, 0, 1), "down")
            .filter(
                Condition::all()
                    .add(vote::Column::VoteableType.eq(owned.voteable_type))
                    .add(Expr::col(owned.owner_column.clone()).eq(owner_id)),
            );
        QueryTrait::query(&mut select).join(
            JoinType::InnerJoin,
            owned.table.clone(),
            Expr::col(owned.id_column.clone()).equals((Vote, vote::Column::VoteableId)),
        );

        let counts = select
            .into_model::<DirectionCounts>()
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(counts.map(VoteStats::from).unwrap_or_default())
    }

    /// Delete a voteable record together with its votes.
    ///
    /// Returns the number of votes removed.
    pub async fn destroy_voteable<E: Voteable>(&self, model: &E::Model) -> AppResult<u64> {
        let target = E::voteable_ref(model);
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = Vote::delete_many()
            .filter(target.as_voteable())
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        E::delete_many()
            .filter(E::voteable_id_column().eq(target.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(voteable = %target, votes_removed = removed, "Destroyed voteable");
        Ok(removed)
    }

    /// Delete a voter record together with the votes it cast.
    ///
    /// Returns the number of votes removed.
    pub async fn destroy_voter<E: Voter>(&self, model: &E::Model) -> AppResult<u64> {
        let voter = E::voter_ref(model);
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = Vote::delete_many()
            .filter(voter.as_voter())
            .exec(&txn)
            .await
            .map_err(db_err)?
            .rows_affected;

        E::delete_many()
            .filter(E::voter_id_column().eq(voter.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(voter = %voter, votes_removed = removed, "Destroyed voter");
        Ok(removed)
    }

    fn new_vote(
        voter: Option<&PolymorphicRef>,
        voteable: &PolymorphicRef,
        direction: bool,
    ) -> vote::ActiveModel {
        let now: DateTimeWithTimeZone = Utc::now().into();
        vote::ActiveModel {
            vote: Set(direction),
            voteable_type: Set(voteable.kind.clone()),
            voteable_id: Set(voteable.id),
            voter_type: Set(voter.map(|v| v.kind.clone())),
            voter_id: Set(voter.map(|v| v.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    fn directed(select: Select<Vote>, filter: VoteFilter) -> Select<Vote> {
        match filter.direction() {
            Some(direction) => select.filter(vote::Column::Vote.eq(direction)),
            None => select,
        }
    }
}
