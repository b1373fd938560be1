//! Karma: a weighted score of the votes received by the records someone owns.

use serde::{Deserialize, Serialize};
use thumbs_up_common::{AppResult, VoteStats};
use thumbs_up_db::{OwnedVoteables, VoteRepository, Voteable};

/// How up and down votes count towards karma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KarmaWeight {
    /// Up votes times the weight; down votes are ignored.
    Up(f64),
    /// Up votes times the first weight minus down votes times the second.
    UpDown(f64, f64),
}

impl Default for KarmaWeight {
    fn default() -> Self {
        Self::Up(1.0)
    }
}

impl KarmaWeight {
    /// Score of one source, rounded half away from zero.
    #[must_use]
    pub fn score(self, stats: VoteStats) -> i64 {
        let up = stats.votes_for as f64;
        let down = stats.votes_against as f64;
        let raw = match self {
            Self::Up(w) => up * w,
            Self::UpDown(w_up, w_down) => up * w_up - down * w_down,
        };
        raw.round() as i64
    }
}

/// A voteable type whose votes count towards its owner's karma.
#[derive(Debug, Clone)]
pub struct KarmaSource {
    owned: OwnedVoteables,
    weight: KarmaWeight,
}

impl KarmaSource {
    /// Records of `E` owned through `owner_column`, weighted 1 per up vote.
    #[must_use]
    pub fn of<E: Voteable>(owner_column: E::Column) -> Self {
        Self {
            owned: OwnedVoteables::of::<E>(owner_column),
            weight: KarmaWeight::default(),
        }
    }

    /// Use a different weight.
    #[must_use]
    pub fn weighted(mut self, weight: KarmaWeight) -> Self {
        self.weight = weight;
        self
    }

    /// The weight applied to this source.
    #[must_use]
    pub const fn weight(&self) -> KarmaWeight {
        self.weight
    }
}

/// Computes karma.
#[derive(Clone)]
pub struct KarmaService {
    vote_repo: VoteRepository,
}

impl KarmaService {
    /// Create a new karma service.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self { vote_repo }
    }

    /// Sum of every source's weighted score for the owner `owner_id`.
    pub async fn karma(&self, owner_id: i64, sources: &[KarmaSource]) -> AppResult<i64> {
        let mut total = 0;
        for source in sources {
            let stats = self
                .vote_repo
                .stats_for_owner(&source.owned, owner_id)
                .await?;
            let score = source.weight.score(stats);
            tracing::debug!(
                owner_id,
                voteable_type = source.owned.voteable_type(),
                score,
                "Karma source scored"
            );
            total += score;
        }
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;
    use thumbs_up_db::fixtures::item;

    #[test]
    fn test_default_weight_counts_up_votes() {
        assert_eq!(KarmaWeight::default().score(VoteStats::new(4, 9)), 4);
    }

    #[test]
    fn test_single_weight_rounds() {
        assert_eq!(KarmaWeight::Up(0.5).score(VoteStats::new(3, 0)), 2);
        assert_eq!(KarmaWeight::Up(0.25).score(VoteStats::new(3, 0)), 1);
    }

    #[test]
    fn test_pair_weight_subtracts_down_votes() {
        let weight = KarmaWeight::UpDown(1.0, 2.0);
        assert_eq!(weight.score(VoteStats::new(3, 2)), -1);
        assert_eq!(weight.score(VoteStats::default()), 0);
    }

    #[tokio::test]
    async fn test_karma_sums_sources() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "up" => Value::BigInt(Some(5)),
                "down" => Value::BigInt(Some(1)),
            }]])
            .append_query_results([[maplit::btreemap! {
                "up" => Value::BigInt(Some(2)),
                "down" => Value::BigInt(Some(3)),
            }]])
            .into_connection();
        let service = KarmaService::new(VoteRepository::new(Arc::new(db)));

        let sources = [
            KarmaSource::of::<item::Entity>(item::Column::UserId),
            KarmaSource::of::<item::Entity>(item::Column::UserId)
                .weighted(KarmaWeight::UpDown(2.0, 1.0)),
        ];
        let karma = service.karma(10, &sources).await.unwrap();

        // 5 * 1 + (2 * 2 - 3 * 1)
        assert_eq!(karma, 6);
    }
}
