//! Voter service: casting, retracting and inspecting votes.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use sea_orm::{Select, prelude::DateTimeWithTimeZone};
use thumbs_up_common::{AppError, AppResult, VoteConfig};
use thumbs_up_db::{
    PolymorphicRef, VoteFilter, VoteRepository, Voteable, Voter, entities::vote, voted_on_by,
};

/// Vote operations for records that cast votes.
#[derive(Clone)]
pub struct VoterService {
    vote_repo: VoteRepository,
    config: Arc<VoteConfig>,
}

impl VoterService {
    /// Create a new voter service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, config: Arc<VoteConfig>) -> Self {
        Self { vote_repo, config }
    }

    /// Cast a vote.
    ///
    /// With `exclusive`, the voter's earlier votes on `voteable` are replaced
    /// atomically. Otherwise, when votes are unique, an existing vote is a
    /// conflict.
    pub async fn vote(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
        direction: bool,
        exclusive: bool,
    ) -> AppResult<vote::Model> {
        let created = if exclusive {
            let (removed, created) = self
                .vote_repo
                .replace(voter, voteable, direction)
                .await?;
            if removed > 0 {
                tracing::debug!(%voter, %voteable, removed, "Replaced earlier votes");
            }
            created
        } else {
            if self.config.unique_votes
                && self
                    .vote_repo
                    .has_voted(voter, voteable, VoteFilter::All)
                    .await?
            {
                return Err(AppError::Conflict(format!(
                    "{voter} has already voted on {voteable}"
                )));
            }
            self.vote_repo
                .cast(Some(voter), voteable, direction)
                .await?
        };

        tracing::info!(%voter, %voteable, vote = direction, "Vote cast");
        Ok(created)
    }

    /// Cast an up vote.
    pub async fn vote_for(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<vote::Model> {
        self.vote(voter, voteable, true, false).await
    }

    /// Cast a down vote.
    pub async fn vote_against(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<vote::Model> {
        self.vote(voter, voteable, false, false).await
    }

    /// Replace any earlier vote with an up vote.
    pub async fn vote_exclusively_for(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<vote::Model> {
        self.vote(voter, voteable, true, true).await
    }

    /// Replace any earlier vote with a down vote.
    pub async fn vote_exclusively_against(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<vote::Model> {
        self.vote(voter, voteable, false, true).await
    }

    /// Remove the voter's votes on `voteable`. Returns how many were removed.
    pub async fn unvote_for(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<u64> {
        let removed = self
            .vote_repo
            .delete_by_voter_and_voteable(voter, voteable)
            .await?;
        tracing::info!(%voter, %voteable, removed, "Votes retracted");
        Ok(removed)
    }

    /// Whether the voter voted up on `voteable`.
    pub async fn voted_for(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<bool> {
        self.vote_repo
            .has_voted(voter, voteable, VoteFilter::For)
            .await
    }

    /// Whether the voter voted down on `voteable`.
    pub async fn voted_against(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<bool> {
        self.vote_repo
            .has_voted(voter, voteable, VoteFilter::Against)
            .await
    }

    /// Whether the voter voted on `voteable` at all.
    pub async fn voted_on(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<bool> {
        self.vote_repo
            .has_voted(voter, voteable, VoteFilter::All)
            .await
    }

    /// Direction of the voter's vote on `voteable`, if any.
    pub async fn voted_which_way(
        &self,
        voter: &PolymorphicRef,
        voteable: &PolymorphicRef,
    ) -> AppResult<Option<bool>> {
        let found = self
            .vote_repo
            .find_by_voter_and_voteable(voter, voteable)
            .await?;
        Ok(found.map(|v| v.vote))
    }

    /// Number of votes the voter has cast.
    pub async fn vote_count(&self, voter: &PolymorphicRef, filter: VoteFilter) -> AppResult<u64> {
        self.vote_repo.count_for_voter(voter, filter).await
    }

    /// Records of `E` the voter voted on, most recent vote first.
    #[must_use]
    pub fn voted_on_by<E: Voteable>(
        &self,
        voter: &PolymorphicRef,
        filter: VoteFilter,
    ) -> Select<E> {
        voted_on_by::<E>(&self.config, voter, filter)
    }

    /// Votes cast by the voter, newest first.
    pub async fn for_voter(&self, voter: &PolymorphicRef) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_for_voter(voter).await
    }

    /// Votes on `voteable`, newest first.
    pub async fn for_voteable(&self, voteable: &PolymorphicRef) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_for_voteable(voteable).await
    }

    /// Votes created after `since`, newest first.
    pub async fn recent(&self, since: DateTimeWithTimeZone) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_recent(since).await
    }

    /// Votes created within `window` of now, newest first.
    pub async fn recent_within(&self, window: TimeDelta) -> AppResult<Vec<vote::Model>> {
        self.recent((Utc::now() - window).into()).await
    }

    /// Bump a vote's `updated_at`.
    pub async fn touch(&self, vote_id: i32) -> AppResult<()> {
        self.vote_repo.touch(vote_id).await
    }

    /// Delete a voter record together with the votes it cast.
    pub async fn destroy_voter<E: Voter>(&self, model: &E::Model) -> AppResult<u64> {
        self.vote_repo.destroy_voter::<E>(model).await
    }
}
