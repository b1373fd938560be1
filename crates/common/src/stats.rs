//! Per-voteable vote statistics.

use serde::Serialize;

use crate::score::wilson_lower_bound;

/// Added to the denominator of percentages so that zero votes yield 0%.
const PERCENT_EPSILON: f64 = 0.0001;

/// Up and down vote counts of a single voteable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteStats {
    /// Number of up votes.
    pub votes_for: u64,
    /// Number of down votes.
    pub votes_against: u64,
}

impl VoteStats {
    /// Create stats from up and down counts.
    #[must_use]
    pub const fn new(votes_for: u64, votes_against: u64) -> Self {
        Self {
            votes_for,
            votes_against,
        }
    }

    /// Total number of votes, saturating at `u64::MAX`.
    #[must_use]
    pub const fn votes_count(&self) -> u64 {
        self.votes_for.saturating_add(self.votes_against)
    }

    /// Share of up votes in percent, rounded to the nearest integer.
    #[must_use]
    pub fn percent_for(&self) -> u8 {
        self.percent_of(self.votes_for)
    }

    /// Share of down votes in percent, rounded to the nearest integer.
    #[must_use]
    pub fn percent_against(&self) -> u8 {
        self.percent_of(self.votes_against)
    }

    fn percent_of(&self, count: u64) -> u8 {
        let total = self.votes_count() as f64 + PERCENT_EPSILON;
        let percent = (count as f64 * 100.0 / total).round();
        // count <= total keeps this within 0..=100
        percent as u8
    }

    /// Net score: up votes minus down votes, saturating at the `i64` bounds.
    #[must_use]
    pub fn plusminus(&self) -> i64 {
        let up = i64::try_from(self.votes_for).unwrap_or(i64::MAX);
        let down = i64::try_from(self.votes_against).unwrap_or(i64::MAX);
        up.saturating_sub(down)
    }

    /// Wilson score lower bound of the up-vote share.
    #[must_use]
    pub fn ci_plusminus(&self, confidence: f64) -> f64 {
        wilson_lower_bound(self.votes_for, self.votes_count(), confidence)
    }
}
