//! Voteable service: per-record vote reads, tallies and scores.

use std::sync::Arc;

use futures::future::try_join_all;
use sea_orm::DatabaseConnection;
use thumbs_up_common::{AppResult, VoteConfig, VoteStats};
use thumbs_up_db::{
    PlusminusTallyOptions, PlusminusTallyQuery, PolymorphicRef, TallyOptions, TallyQuery,
    VoteFilter, VoteRepository, Voteable, entities::vote,
};

use crate::resolver::ResolverRegistry;

/// Vote reads for records that receive votes.
#[derive(Clone)]
pub struct VoteableService {
    vote_repo: VoteRepository,
    config: Arc<VoteConfig>,
}

impl VoteableService {
    /// Create a new voteable service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository, config: Arc<VoteConfig>) -> Self {
        Self { vote_repo, config }
    }

    /// The vote settings in use.
    #[must_use]
    pub fn config(&self) -> &VoteConfig {
        &self.config
    }

    /// The connection tally builders run against.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.vote_repo.connection()
    }

    /// Number of up votes.
    pub async fn votes_for(&self, target: &PolymorphicRef) -> AppResult<u64> {
        self.vote_repo
            .count_for_voteable(target, VoteFilter::For)
            .await
    }

    /// Number of down votes.
    pub async fn votes_against(&self, target: &PolymorphicRef) -> AppResult<u64> {
        self.vote_repo
            .count_for_voteable(target, VoteFilter::Against)
            .await
    }

    /// Number of votes in either direction.
    pub async fn votes_count(&self, target: &PolymorphicRef) -> AppResult<u64> {
        self.vote_repo
            .count_for_voteable(target, VoteFilter::All)
            .await
    }

    /// Up and down counts fetched together, for deriving several numbers
    /// from one query.
    pub async fn stats(&self, target: &PolymorphicRef) -> AppResult<VoteStats> {
        self.vote_repo.stats_for_voteable(target).await
    }

    /// Share of up votes, 0 to 100.
    pub async fn percent_for(&self, target: &PolymorphicRef) -> AppResult<u8> {
        Ok(self.stats(target).await?.percent_for())
    }

    /// Share of down votes, 0 to 100.
    pub async fn percent_against(&self, target: &PolymorphicRef) -> AppResult<u8> {
        Ok(self.stats(target).await?.percent_against())
    }

    /// Up votes minus down votes.
    pub async fn plusminus(&self, target: &PolymorphicRef) -> AppResult<i64> {
        Ok(self.stats(target).await?.plusminus())
    }

    /// Wilson score lower bound of the up vote ratio.
    pub async fn ci_plusminus(&self, target: &PolymorphicRef, confidence: f64) -> AppResult<f64> {
        Ok(self.stats(target).await?.ci_plusminus(confidence))
    }

    /// Distinct voters, any direction.
    pub async fn voters_who_voted(
        &self,
        target: &PolymorphicRef,
    ) -> AppResult<Vec<PolymorphicRef>> {
        self.vote_repo
            .distinct_voters(target, VoteFilter::All)
            .await
    }

    /// Distinct voters who voted up.
    pub async fn voters_who_voted_for(
        &self,
        target: &PolymorphicRef,
    ) -> AppResult<Vec<PolymorphicRef>> {
        self.vote_repo
            .distinct_voters(target, VoteFilter::For)
            .await
    }

    /// Distinct voters who voted down.
    pub async fn voters_who_voted_against(
        &self,
        target: &PolymorphicRef,
    ) -> AppResult<Vec<PolymorphicRef>> {
        self.vote_repo
            .distinct_voters(target, VoteFilter::Against)
            .await
    }

    /// Distinct voters mapped to host records.
    ///
    /// Voters whose record no longer exists are left out.
    pub async fn resolve_voters<T: Send + 'static>(
        &self,
        target: &PolymorphicRef,
        filter: VoteFilter,
        registry: &ResolverRegistry<T>,
    ) -> AppResult<Vec<T>> {
        let voters = self.vote_repo.distinct_voters(target, filter).await?;
        let lookups = voters.iter().map(|voter| registry.resolve(voter));
        let resolved = try_join_all(lookups).await?;
        Ok(resolved.into_iter().flatten().collect())
    }

    /// Whether `voter` has voted on `target`.
    pub async fn voted_by(
        &self,
        target: &PolymorphicRef,
        voter: &PolymorphicRef,
    ) -> AppResult<bool> {
        self.vote_repo
            .has_voted(voter, target, VoteFilter::All)
            .await
    }

    /// Votes on `target`, newest first.
    pub async fn votes(&self, target: &PolymorphicRef) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_for_voteable(target).await
    }

    /// Vote count tally over every record of `E`.
    #[must_use]
    pub fn tally<E: Voteable>(&self, options: TallyOptions) -> TallyQuery<E> {
        TallyQuery::new(&self.config, options)
    }

    /// Net score tally over every record of `E`.
    #[must_use]
    pub fn plusminus_tally<E: Voteable>(
        &self,
        options: PlusminusTallyOptions,
    ) -> PlusminusTallyQuery<E> {
        PlusminusTallyQuery::new(&self.config, options)
    }

    /// Delete a record together with its votes.
    pub async fn destroy_voteable<E: Voteable>(&self, model: &E::Model) -> AppResult<u64> {
        self.vote_repo.destroy_voteable::<E>(model).await
    }
}
