use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Immutable audit record for Offer/Request aggregates. Append-only;
/// never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "changes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub who: i32,
    /// One of `super::ChangeAction`, stored lowercase.
    pub action: String,
    /// One of `super::ChangeType`, stored lowercase.
    pub change_type: String,
    /// Human-readable label of the aggregate that changed.
    pub what: String,
    #[sea_orm(column_type = "Text")]
    pub before: String,
    #[sea_orm(column_type = "Text")]
    pub after: String,
    pub when: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contact::Entity",
        from = "Column::Who",
        to = "super::contact::Column::Id"
    )]
    Who,
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Who.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
