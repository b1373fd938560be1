//! Vote count tally over every record of a voteable type.

use futures::{Stream, StreamExt};
use sea_orm::{
    Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait, FromQueryResult, IntoSimpleExpr,
    Iterable, JoinType, Order, QueryFilter, QueryOrder, QueryResult, QuerySelect, QueryTrait,
    Select, Statement, StreamTrait,
    prelude::DateTimeWithTimeZone,
    sea_query::{Alias, Expr, IntoCondition, SimpleExpr},
};
use serde::Serialize;
use thumbs_up_common::{AppResult, VoteConfig};

use super::{db_err, vote_col, voteable_join};
use crate::entities::vote;
use crate::polymorphic::Voteable;

/// Options for [`TallyQuery`].
#[derive(Debug, Clone, Default)]
pub struct TallyOptions {
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Only count votes created at or after this instant.
    pub start_at: Option<DateTimeWithTimeZone>,
    /// Only count votes created at or before this instant.
    pub end_at: Option<DateTimeWithTimeZone>,
    /// Extra predicate ANDed into the WHERE clause.
    pub conditions: Option<Condition>,
    /// Ordering; empty means `vote_count` descending.
    pub order: Vec<(SimpleExpr, Order)>,
    /// Keep rows with at least this many votes.
    pub at_least: Option<i64>,
    /// Keep rows with at most this many votes.
    pub at_most: Option<i64>,
}

impl TallyOptions {
    /// Cap the number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Count only votes created at or after `at`.
    #[must_use]
    pub fn start_at(mut self, at: DateTimeWithTimeZone) -> Self {
        self.start_at = Some(at);
        self
    }

    /// Count only votes created at or before `at`.
    #[must_use]
    pub fn end_at(mut self, at: DateTimeWithTimeZone) -> Self {
        self.end_at = Some(at);
        self
    }

    /// AND a predicate into the WHERE clause.
    #[must_use]
    pub fn conditions<F: IntoCondition>(mut self, conditions: F) -> Self {
        self.conditions = Some(conditions.into_condition());
        self
    }

    /// Append an ordering term, replacing the default ordering.
    #[must_use]
    pub fn order_by<C: IntoSimpleExpr>(mut self, expr: C, order: Order) -> Self {
        self.order.push((expr.into_simple_expr(), order));
        self
    }

    /// Keep rows with at least `count` votes.
    #[must_use]
    pub fn at_least(mut self, count: i64) -> Self {
        self.at_least = Some(count);
        self
    }

    /// Keep rows with at most `count` votes.
    #[must_use]
    pub fn at_most(mut self, count: i64) -> Self {
        self.at_most = Some(count);
        self
    }
}

/// A voteable record with its number of votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyRow<M> {
    /// The voteable record.
    pub model: M,
    /// Number of votes counted for it.
    pub vote_count: i64,
}

impl<M: FromQueryResult> FromQueryResult for TallyRow<M> {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            model: M::from_query_result(res, pre)?,
            vote_count: res.try_get(pre, "vote_count")?,
        })
    }
}

/// Every record of `E` (including ones without votes) with its vote count.
///
/// Votes are LEFT JOINed under the configured voteable relationship name,
/// so further filters can refer to e.g. `votes.created_at`.
#[derive(Debug, Clone)]
pub struct TallyQuery<E: Voteable> {
    select: Select<E>,
    vote_count: SimpleExpr,
}

impl<E: Voteable> TallyQuery<E> {
    /// Describe a tally of `E`.
    #[must_use]
    pub fn new(config: &VoteConfig, options: TallyOptions) -> Self {
        let alias = Alias::new(config.voteable_relationship_name.as_str());
        let voteable_id: SimpleExpr = vote_col(&alias, vote::Column::VoteableId).into();
        let vote_count: SimpleExpr = vote_col(&alias, vote::Column::VoteableId).count();

        // Time bounds go into the join so records without matching votes
        // still come back with a zero count.
        let mut on = voteable_join::<E>(&alias);
        if let Some(start_at) = options.start_at {
            on = on.add(vote_col(&alias, vote::Column::CreatedAt).gte(start_at));
        }
        if let Some(end_at) = options.end_at {
            on = on.add(vote_col(&alias, vote::Column::CreatedAt).lte(end_at));
        }

        let mut select = E::find();
        QueryTrait::query(&mut select).join_as(
            JoinType::LeftJoin,
            vote::Entity,
            alias.clone(),
            on,
        );

        select = select.column_as(vote_count.clone(), "vote_count");
        select = select.group_by(voteable_id);
        for column in E::Column::iter() {
            select = select.group_by(column);
        }

        if let Some(conditions) = options.conditions {
            select = select.filter(conditions);
        }

        if options.order.is_empty() {
            select = select.order_by(vote_count.clone(), Order::Desc);
        } else {
            for (expr, order) in options.order {
                select = select.order_by(expr, order);
            }
        }

        if let Some(limit) = options.limit {
            select = select.limit(limit);
        }

        // All aggregate bounds go into one HAVING clause; the `>= 0` base
        // keeps the clause present even without bounds.
        let mut having = Condition::all().add(Expr::expr(vote_count.clone()).gte(0));
        if let Some(at_least) = options.at_least {
            having = having.add(Expr::expr(vote_count.clone()).gte(at_least));
        }
        if let Some(at_most) = options.at_most {
            having = having.add(Expr::expr(vote_count.clone()).lte(at_most));
        }
        select = select.having(having);

        Self { select, vote_count }
    }

    /// The `COUNT(...)` expression, for layering further filters or orderings.
    #[must_use]
    pub fn vote_count_expr(&self) -> SimpleExpr {
        self.vote_count.clone()
    }

    /// AND a predicate into the WHERE clause.
    #[must_use]
    pub fn filter<F: IntoCondition>(mut self, filter: F) -> Self {
        self.select = self.select.filter(filter);
        self
    }

    /// AND a predicate into the HAVING clause.
    #[must_use]
    pub fn having<F: IntoCondition>(mut self, filter: F) -> Self {
        self.select = self.select.having(filter);
        self
    }

    /// Append an ordering term.
    #[must_use]
    pub fn order_by<C: IntoSimpleExpr>(mut self, expr: C, order: Order) -> Self {
        self.select = self.select.order_by(expr, order);
        self
    }

    /// Cap the number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.select = self.select.limit(limit);
        self
    }

    /// Add a GROUP BY term.
    #[must_use]
    pub fn group_by<C: IntoSimpleExpr>(mut self, expr: C) -> Self {
        self.select = self.select.group_by(expr);
        self
    }

    /// The underlying `sea-orm` select.
    #[must_use]
    pub fn into_select(self) -> Select<E> {
        self.select
    }

    /// Render the statement for a backend.
    #[must_use]
    pub fn build(&self, backend: DbBackend) -> Statement {
        self.select.build(backend)
    }

    /// Run the query and collect every row.
    pub async fn all<C: ConnectionTrait>(self, db: &C) -> AppResult<Vec<TallyRow<E::Model>>> {
        tracing::debug!(voteable_type = E::VOTEABLE_TYPE, "Running vote tally");
        self.select
            .into_model::<TallyRow<E::Model>>()
            .all(db)
            .await
            .map_err(db_err)
    }

    /// Run the query and yield rows as they arrive.
    pub async fn stream<'a: 'b, 'b, C>(
        self,
        db: &'a C,
    ) -> AppResult<impl Stream<Item = AppResult<TallyRow<E::Model>>> + 'b + Send>
    where
        C: ConnectionTrait + StreamTrait + Send,
        E::Model: Send + 'b,
    {
        let rows = self
            .select
            .into_model::<TallyRow<E::Model>>()
            .stream(db)
            .await
            .map_err(db_err)?;
        Ok(rows.map(|row| row.map_err(db_err)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::item;
    use chrono::{TimeZone, Utc};
    use sea_orm::{ColumnTrait, DatabaseBackend, MockDatabase, Value};

    fn sql(query: &TallyQuery<item::Entity>) -> String {
        query.build(DatabaseBackend::Postgres).to_string()
    }

    fn tally_row(
        id: i64,
        name: &str,
        vote_count: i64,
    ) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! {
            "id" => Value::BigInt(Some(id)),
            "user_id" => Value::BigInt(Some(1)),
            "name" => Value::from(name),
            "vote_count" => Value::BigInt(Some(vote_count)),
        }
    }

    #[test]
    fn test_default_tally_shape() {
        let query =
            TallyQuery::<item::Entity>::new(&VoteConfig::default(), TallyOptions::default());
        let sql = sql(&query);

        assert!(sql.contains(r#"LEFT JOIN "votes" AS "votes""#), "{sql}");
        assert!(
            sql.contains(r#""items"."id" = "votes"."voteable_id""#),
            "{sql}"
        );
        assert!(sql.contains(r#""votes"."voteable_type" = 'Item'"#), "{sql}");
        assert!(
            sql.contains(r#"COUNT("votes"."voteable_id") AS "vote_count""#),
            "{sql}"
        );
        assert!(
            sql.contains(
                r#"GROUP BY "votes"."voteable_id", "items"."id", "items"."user_id", "items"."name""#
            ),
            "{sql}"
        );
        assert!(
            sql.contains(r#"HAVING COUNT("votes"."voteable_id") >= 0"#),
            "{sql}"
        );
        assert!(
            sql.contains(r#"ORDER BY COUNT("votes"."voteable_id") DESC"#),
            "{sql}"
        );
        assert!(!sql.contains("LIMIT"), "{sql}");
    }

    #[test]
    fn test_custom_relationship_name_is_the_join_alias() {
        let config = VoteConfig::with_relationship_names("votes_on", "votes_by");
        let query = TallyQuery::<item::Entity>::new(&config, TallyOptions::default());
        let sql = sql(&query);

        assert!(sql.contains(r#"LEFT JOIN "votes" AS "votes_on""#), "{sql}");
        assert!(sql.contains(r#"COUNT("votes_on"."voteable_id")"#), "{sql}");
    }

    #[test]
    fn test_aggregate_bounds_share_one_having_clause() {
        let options = TallyOptions::default().at_least(2).at_most(5);
        let query = TallyQuery::<item::Entity>::new(&VoteConfig::default(), options);
        let sql = sql(&query);

        assert_eq!(sql.matches("HAVING").count(), 1, "{sql}");
        assert!(
            sql.contains(
                r#"HAVING COUNT("votes"."voteable_id") >= 0 AND COUNT("votes"."voteable_id") >= 2 AND COUNT("votes"."voteable_id") <= 5"#
            ),
            "{sql}"
        );
    }

    #[test]
    fn test_time_bounds_restrict_the_join() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let options = TallyOptions::default()
            .start_at(start.into())
            .end_at(end.into());
        let query = TallyQuery::<item::Entity>::new(&VoteConfig::default(), options);
        let sql = sql(&query);

        let on = sql.split(" WHERE ").next().unwrap();
        let on = on.split(" GROUP BY ").next().unwrap();
        assert!(
            on.contains(r#""votes"."created_at" >= '2024-01-01"#),
            "{sql}"
        );
        assert!(
            on.contains(r#""votes"."created_at" <= '2024-02-01"#),
            "{sql}"
        );
    }

    #[test]
    fn test_conditions_order_and_limit() {
        let options = TallyOptions::default()
            .conditions(item::Column::UserId.eq(7))
            .order_by(item::Column::Name, Order::Asc)
            .limit(10);
        let query = TallyQuery::<item::Entity>::new(&VoteConfig::default(), options);
        let sql = sql(&query);

        assert!(sql.contains(r#"WHERE "items"."user_id" = 7"#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "items"."name" ASC"#), "{sql}");
        assert!(!sql.contains("DESC"), "{sql}");
        assert!(sql.contains("LIMIT 10"), "{sql}");
    }

    #[test]
    fn test_layered_filters() {
        let query = TallyQuery::<item::Entity>::new(&VoteConfig::default(), TallyOptions::default())
            .filter(item::Column::Name.like("w%"))
            .limit(3);
        let count = query.vote_count_expr();
        let query = query.having(Expr::expr(count).lt(100));
        let sql = sql(&query);

        assert!(sql.contains(r#""items"."name" LIKE 'w%'"#), "{sql}");
        assert!(
            sql.contains(r#"COUNT("votes"."voteable_id") < 100"#),
            "{sql}"
        );
        assert!(sql.contains("LIMIT 3"), "{sql}");
    }

    #[tokio::test]
    async fn test_all_reads_models_with_counts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                tally_row(2, "popular", 5),
                tally_row(3, "liked", 2),
                tally_row(1, "ignored", 0),
            ]])
            .into_connection();

        let rows = TallyQuery::<item::Entity>::new(&VoteConfig::default(), TallyOptions::default())
            .all(&db)
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].model.name, "popular");
        assert_eq!(rows[0].vote_count, 5);
        assert_eq!(rows[2].model.id, 1);
        assert_eq!(rows[2].vote_count, 0);
    }
}
