//! Host entities used by unit tests.

#![allow(missing_docs)]

pub mod item {
    use sea_orm::entity::prelude::*;

    use crate::polymorphic::Voteable;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        pub user_id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Voteable for Entity {
        const VOTEABLE_TYPE: &'static str = "Item";

        fn voteable_id_column() -> Column {
            Column::Id
        }

        fn voteable_id(model: &Model) -> i64 {
            model.id
        }
    }
}

pub mod user {
    use sea_orm::entity::prelude::*;

    use crate::polymorphic::Voter;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Voter for Entity {
        const VOTER_TYPE: &'static str = "User";

        fn voter_id_column() -> Column {
            Column::Id
        }

        fn voter_id(model: &Model) -> i64 {
            model.id
        }
    }
}
