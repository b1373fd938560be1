//! Net score tally over every record of a voteable type.

use futures::{Stream, StreamExt};
use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, EntityTrait, FromQueryResult, IntoSimpleExpr, Iterable,
    JoinType, Order, QueryFilter, QueryOrder, QueryResult, QuerySelect, QueryTrait, Select,
    Statement, StreamTrait,
    sea_query::{Alias, IntoCondition, SimpleExpr},
};
use serde::Serialize;
use thumbs_up_common::{AppResult, VoteConfig};

use super::{db_err, direction_sum, vote_col, voteable_join};
use crate::entities::vote;
use crate::polymorphic::Voteable;

/// Options for [`PlusminusTallyQuery`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlusminusTallyOptions {
    /// Also select the `up` and `down` sums.
    pub separate_updown: bool,
}

impl PlusminusTallyOptions {
    /// Options selecting `up` and `down` next to the net score.
    #[must_use]
    pub const fn separate_updown() -> Self {
        Self {
            separate_updown: true,
        }
    }
}

/// A voteable record with its net score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlusminusTallyRow<M> {
    /// The voteable record.
    pub model: M,
    /// Up votes minus down votes.
    pub plusminus_tally: i64,
    /// Up votes, when requested.
    pub up: Option<i64>,
    /// Down votes, when requested.
    pub down: Option<i64>,
    /// Total votes.
    pub vote_count: i64,
}

impl<M> PlusminusTallyRow<M> {
    /// Net score of the row.
    #[must_use]
    pub const fn plusminus(&self) -> i64 {
        self.plusminus_tally
    }
}

impl<M: FromQueryResult> FromQueryResult for PlusminusTallyRow<M> {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            model: M::from_query_result(res, pre)?,
            plusminus_tally: res
                .try_get::<Option<i64>>(pre, "plusminus_tally")?
                .unwrap_or_default(),
            // absent unless the query selected them
            up: res.try_get::<Option<i64>>(pre, "up").ok().flatten(),
            down: res.try_get::<Option<i64>>(pre, "down").ok().flatten(),
            vote_count: res.try_get(pre, "vote_count")?,
        })
    }
}

/// Every record of `E` with the sum of `+1` per up vote and `-1` per down
/// vote, highest first.
#[derive(Debug, Clone)]
pub struct PlusminusTallyQuery<E: Voteable> {
    select: Select<E>,
    plusminus: SimpleExpr,
}

impl<E: Voteable> PlusminusTallyQuery<E> {
    /// Describe a net score tally of `E`.
    #[must_use]
    pub fn new(config: &VoteConfig, options: PlusminusTallyOptions) -> Self {
        let alias = Alias::new(config.voteable_relationship_name.as_str());
        let plusminus = direction_sum(&alias, 1, -1);

        let mut select = E::find();
        QueryTrait::query(&mut select).join_as(
            JoinType::LeftJoin,
            vote::Entity,
            alias.clone(),
            voteable_join::<E>(&alias),
        );

        select = select
            .order_by(plusminus.clone(), Order::Desc)
            .column_as(plusminus.clone(), "plusminus_tally");
        for column in E::Column::iter() {
            select = select.group_by(column);
        }
        if options.separate_updown {
            select = select
                .column_as(direction_sum(&alias, 1, 0), "up")
                .column_as(direction_sum(&alias, 0, 1), "down");
        }
        select = select.column_as(vote_col(&alias, vote::Column::Id).count(), "vote_count");

        Self { select, plusminus }
    }

    /// The `SUM(CASE ...)` net score expression.
    #[must_use]
    pub fn plusminus_expr(&self) -> SimpleExpr {
        self.plusminus.clone()
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
    pub async fn all<C: ConnectionTrait>(
        self,
        db: &C,
    ) -> AppResult<Vec<PlusminusTallyRow<E::Model>>> {
        tracing::debug!(voteable_type = E::VOTEABLE_TYPE, "Running plusminus tally");
        self.select
            .into_model::<PlusminusTallyRow<E::Model>>()
            .all(db)
            .await
            .map_err(db_err)
    }

    /// Run the query and yield rows as they arrive.
    pub async fn stream<'a: 'b, 'b, C>(
        self,
        db: &'a C,
    ) -> AppResult<impl Stream<Item = AppResult<PlusminusTallyRow<E::Model>>> + 'b + Send>
    where
        C: ConnectionTrait + StreamTrait + Send,
        E::Model: Send + 'b,
    {
        let rows = self
            .select
            .into_model::<PlusminusTallyRow<E::Model>>()
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
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[test]
    fn test_plusminus_shape() {
        let query = PlusminusTallyQuery::<item::Entity>::new(
            &VoteConfig::default(),
            PlusminusTallyOptions::default(),
        );
        let sql = query.build(DatabaseBackend::Postgres).to_string();

        assert!(sql.contains(r#"LEFT JOIN "votes" AS "votes""#), "{sql}");
        assert!(sql.contains(r#"AS "plusminus_tally""#), "{sql}");
        assert!(
            sql.contains(r#"COUNT("votes"."id") AS "vote_count""#),
            "{sql}"
        );
        assert!(sql.contains("ORDER BY SUM("), "{sql}");
        assert!(!sql.contains(r#"AS "up""#), "{sql}");
        assert!(!sql.contains(r#"AS "down""#), "{sql}");
    }

    #[test]
    fn test_separate_updown_adds_columns() {
        let query = PlusminusTallyQuery::<item::Entity>::new(
            &VoteConfig::default(),
            PlusminusTallyOptions::separate_updown(),
        );
        let sql = query.build(DatabaseBackend::Postgres).to_string();

        assert!(sql.contains(r#"AS "up""#), "{sql}");
        assert!(sql.contains(r#"AS "down""#), "{sql}");
    }

    #[tokio::test]
    async fn test_rows_without_updown() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "id" => Value::BigInt(Some(1)),
                "user_id" => Value::BigInt(Some(1)),
                "name" => Value::from("widget"),
                "plusminus_tally" => Value::BigInt(Some(2)),
                "vote_count" => Value::BigInt(Some(4)),
            }]])
            .into_connection();

        let rows = PlusminusTallyQuery::<item::Entity>::new(
            &VoteConfig::default(),
            PlusminusTallyOptions::default(),
        )
        .all(&db)
        .await
        .unwrap();

        assert_eq!(rows[0].plusminus(), 2);
        assert_eq!(rows[0].vote_count, 4);
        assert_eq!(rows[0].up, None);
        assert_eq!(rows[0].down, None);
    }

    #[tokio::test]
    async fn test_rows_with_updown() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "id" => Value::BigInt(Some(1)),
                "user_id" => Value::BigInt(Some(1)),
                "name" => Value::from("widget"),
                "plusminus_tally" => Value::BigInt(Some(-1)),
                "up" => Value::BigInt(Some(1)),
                "down" => Value::BigInt(Some(2)),
                "vote_count" => Value::BigInt(Some(3)),
            }]])
            .into_connection();

        let rows = PlusminusTallyQuery::<item::Entity>::new(
            &VoteConfig::default(),
            PlusminusTallyOptions::separate_updown(),
        )
        .all(&db)
        .await
        .unwrap();

        assert_eq!(rows[0].plusminus(), -1);
        assert_eq!(rows[0].up, Some(1));
        assert_eq!(rows[0].down, Some(2));
        assert_eq!(
            rows[0].up.unwrap() - rows[0].down.unwrap(),
            rows[0].plusminus()
        );
    }
}
