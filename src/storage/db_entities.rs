//! SeaORM entity models used by the database storage backend.
//!
//! These structs map to the SQLite tables created by `database_storage`:
//! - `owners` — people owning zero or more dogs
//! - `dogs` — animals referencing at most one owner

/// Owners table entity models.
pub mod owners {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "owners")]
    pub struct Model {
        /// Auto-increment row id
        #[sea_orm(primary_key)]
        pub id: i32,
        pub first_name: String,
        pub last_name: String,
        pub city: String,
        pub postal_code: String,
        /// Unique across the table
        #[sea_orm(unique)]
        pub email: String,
        pub phone: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::dogs::Entity")]
        Dogs,
    }

    impl Related<super::dogs::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Dogs.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Dogs table entity models.
pub mod dogs {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "dogs")]
    pub struct Model {
        /// Auto-increment row id
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub birth_date: Date,
        pub weight: f64,
        /// Nullable foreign key to `owners.id`
        pub owner_id: Option<i32>,
        /// Sex stored as its lowercase name
        pub sex: String,
        pub sterilized: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        /// Belongs to an owner
        #[sea_orm(
            belongs_to = "super::owners::Entity",
            from = "Column::OwnerId",
            to = "super::owners::Column::Id"
        )]
        Owner,
    }

    impl Related<super::owners::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Owner.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
