//! Polymorphic references and the voteable / voter capabilities.
//!
//! A vote points at its voteable and voter through a `(type, id)` pair
//! rather than a foreign key, so any entity can take part once it
//! implements [`Voteable`] or [`Voter`].

use std::fmt;

use sea_orm::{ColumnTrait, EntityTrait, sea_query::SimpleExpr};
use serde::{Deserialize, Serialize};

use crate::entities::vote;

/// A `(type tag, id)` reference to a record of any entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolymorphicRef {
    /// Type tag as stored in the `*_type` column.
    pub kind: String,
    /// Record id as stored in the `*_id` column.
    pub id: i64,
}

impl PolymorphicRef {
    /// Create a reference.
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    /// Condition matching votes cast on this record.
    #[must_use]
    pub fn as_voteable(&self) -> SimpleExpr {
        vote::Column::VoteableType
            .eq(self.kind.as_str())
            .and(vote::Column::VoteableId.eq(self.id))
    }

    /// Condition matching votes cast by this record.
    #[must_use]
    pub fn as_voter(&self) -> SimpleExpr {
        vote::Column::VoterType
            .eq(self.kind.as_str())
            .and(vote::Column::VoterId.eq(self.id))
    }
}

impl fmt::Display for PolymorphicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// An entity whose records can receive votes.
pub trait Voteable: EntityTrait {
    /// Type tag written to `votes.voteable_type`.
    const VOTEABLE_TYPE: &'static str;

    /// Column holding the id that `votes.voteable_id` refers to.
    fn voteable_id_column() -> Self::Column;

    /// Id of a record.
    fn voteable_id(model: &Self::Model) -> i64;

    /// Polymorphic reference to a record.
    fn voteable_ref(model: &Self::Model) -> PolymorphicRef {
        PolymorphicRef::new(Self::VOTEABLE_TYPE, Self::voteable_id(model))
    }
}

/// An entity whose records can cast votes.
pub trait Voter: EntityTrait {
    /// Type tag written to `votes.voter_type`.
    const VOTER_TYPE: &'static str;

    /// Column holding the id that `votes.voter_id` refers to.
    fn voter_id_column() -> Self::Column;

    /// Id of a record.
    fn voter_id(model: &Self::Model) -> i64;

    /// Polymorphic reference to a record.
    fn voter_ref(model: &Self::Model) -> PolymorphicRef {
        PolymorphicRef::new(Self::VOTER_TYPE, Self::voter_id(model))
    }
}

/// Which votes to consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoteFilter {
    /// Up and down votes.
    #[default]
    All,
    /// Up votes only.
    For,
    /// Down votes only.
    Against,
}

impl VoteFilter {
    /// Vote direction this filter selects, if restricted.
    #[must_use]
    pub const fn direction(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::For => Some(true),
            Self::Against => Some(false),
        }
    }
}
