//! Composable aggregate queries over voteables.
//!
//! Builders here only describe SQL; nothing touches the database until
//! `all` or `stream` is called on them.

pub mod plusminus;
pub mod tally;
pub mod voted;

pub use plusminus::{PlusminusTallyOptions, PlusminusTallyQuery, PlusminusTallyRow};
pub use tally::{TallyOptions, TallyQuery, TallyRow};
pub use voted::voted_on_by;

use sea_orm::{
    ColumnTrait, Condition, DbErr,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use thumbs_up_common::AppError;

use crate::entities::vote;
use crate::polymorphic::Voteable;

#[allow(clippy::needless_pass_by_value)]
pub(crate) fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// A vote column addressed through the alias the votes table is joined as.
pub(crate) fn vote_col(alias: &Alias, column: vote::Column) -> Expr {
    Expr::col((alias.clone(), column))
}

/// Join condition tying aliased votes to rows of `E`.
pub(crate) fn voteable_join<E: Voteable>(alias: &Alias) -> Condition {
    Condition::all()
        .add(
            Expr::col(E::voteable_id_column().as_column_ref())
                .equals((alias.clone(), vote::Column::VoteableId)),
        )
        .add(vote_col(alias, vote::Column::VoteableType).eq(E::VOTEABLE_TYPE))
}

/// `SUM(CASE vote WHEN true THEN up WHEN false THEN down ELSE 0 END)`.
pub(crate) fn direction_sum(alias: &Alias, up: i32, down: i32) -> SimpleExpr {
    let expr = Expr::case(vote_col(alias, vote::Column::Vote).eq(true), up)
        .case(vote_col(alias, vote::Column::Vote).eq(false), down)
        .finally(0);
    Func::sum(expr).into()
}
