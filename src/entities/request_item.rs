use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "request_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub request_id: i32,
    /// One of `super::ItemType`, stored lowercase.
    pub item_type: String,
    pub brand: String,
    pub model: String,
    pub amount: i32,
    /// Amount is a ceiling rather than an exact ask.
    pub up_to: bool,
    pub notes: Option<String>,
    /// Same-request alternatives chain: this item is an alternative for the
    /// referenced one. Cycle-checked at write time, never trusted on read.
    pub alternative_for: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn label(&self) -> String {
        let qualifier = if self.up_to { "up to " } else { "" };
        format!("{}{}x {} {}", qualifier, self.amount, self.brand, self.model)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::RequestId",
        to = "super::request::Column::Id"
    )]
    Request,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::AlternativeFor",
        to = "Column::Id"
    )]
    AlternativeFor,
    #[sea_orm(has_many = "super::claim::Entity")]
    Claims,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl Related<super::claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
