//! Voteables a voter has voted on.

use sea_orm::{
    Condition, EntityTrait, JoinType, Order, QueryFilter, QueryOrder, QueryTrait, Select,
    sea_query::{Alias, SimpleExpr},
};
use thumbs_up_common::VoteConfig;

use super::{vote_col, voteable_join};
use crate::entities::vote;
use crate::polymorphic::{PolymorphicRef, VoteFilter, Voteable};

/// Records of `E` that `voter` voted on, most recent vote first.
///
/// Votes are INNER JOINed under the configured voter relationship name.
/// When several votes per voter are allowed a record appears once per vote.
#[must_use]
pub fn voted_on_by<E: Voteable>(
    config: &VoteConfig,
    voter: &PolymorphicRef,
    filter: VoteFilter,
) -> Select<E> {
    let alias = Alias::new(config.voter_relationship_name.as_str());

    let mut select = E::find();
    QueryTrait::query(&mut select).join_as(
        JoinType::InnerJoin,
        vote::Entity,
        alias.clone(),
        voteable_join::<E>(&alias),
    );

    let mut condition = Condition::all()
        .add(vote_col(&alias, vote::Column::VoterType).eq(voter.kind.as_str()))
        .add(vote_col(&alias, vote::Column::VoterId).eq(voter.id));
    if let Some(direction) = filter.direction() {
        condition = condition.add(vote_col(&alias, vote::Column::Vote).eq(direction));
    }

    select
        .filter(condition)
        .order_by(
            SimpleExpr::from(vote_col(&alias, vote::Column::CreatedAt)),
            Order::Desc,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::item;
    use sea_orm::DatabaseBackend;

    #[test]
    fn test_voted_on_by_joins_under_voter_relationship_name() {
        let config = VoteConfig::with_relationship_names("votes_on", "votes_by");
        let voter = PolymorphicRef::new("User", 3);
        let sql = voted_on_by::<item::Entity>(&config, &voter, VoteFilter::For)
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#"INNER JOIN "votes" AS "votes_by""#), "{sql}");
        assert!(sql.contains(r#""votes_by"."voter_type" = 'User'"#), "{sql}");
        assert!(sql.contains(r#""votes_by"."voter_id" = 3"#), "{sql}");
        assert!(sql.contains(r#""votes_by"."vote" = TRUE"#), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "votes_by"."created_at" DESC"#),
            "{sql}"
        );
    }

    #[test]
    fn test_voted_on_by_any_direction() {
        let voter = PolymorphicRef::new("User", 3);
        let sql = voted_on_by::<item::Entity>(&VoteConfig::default(), &voter, VoteFilter::All)
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(!sql.contains(r#""votes"."vote" ="#), "{sql}");
    }
}
