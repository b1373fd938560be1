//! Vote entity: one thumbs up or thumbs down cast on a voteable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::polymorphic::PolymorphicRef;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `true` for an up vote, `false` for a down vote.
    pub vote: bool,

    /// Type tag of the record being voted on.
    pub voteable_type: String,

    /// Id of the record being voted on.
    pub voteable_id: i64,

    /// Type tag of the voter, if any.
    pub voter_type: Option<String>,

    /// Id of the voter, if any.
    pub voter_id: Option<i64>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

// Both sides are polymorphic, so there is no static relation.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Reference to the voted-on record.
    #[must_use]
    pub fn voteable(&self) -> PolymorphicRef {
        PolymorphicRef::new(self.voteable_type.clone(), self.voteable_id)
    }

    /// Reference to the voter, when the vote has one.
    #[must_use]
    pub fn voter(&self) -> Option<PolymorphicRef> {
        match (&self.voter_type, self.voter_id) {
            (Some(kind), Some(id)) => Some(PolymorphicRef::new(kind.clone(), id)),
            _ => None,
        }
    }
}
