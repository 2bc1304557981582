use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "offer_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub offer_id: i32,
    /// One of `super::ItemType`, stored lowercase.
    pub item_type: String,
    pub brand: String,
    pub model: String,
    pub amount: i32,
    pub notes: Option<String>,
    pub received: bool,
    pub rejected: bool,
    /// Request this item has been promised to, if any.
    pub claimed_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Label used in rendered summaries and audit snapshots.
    pub fn label(&self) -> String {
        format!("{}x {} {}", self.amount, self.brand, self.model)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::offer::Entity",
        from = "Column::OfferId",
        to = "super::offer::Column::Id"
    )]
    Offer,
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::ClaimedBy",
        to = "super::request::Column::Id"
    )]
    ClaimedBy,
    #[sea_orm(has_many = "super::shipment_item::Entity")]
    ShipmentItems,
    #[sea_orm(has_many = "super::claim::Entity")]
    Claims,
}

impl Related<super::offer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offer.def()
    }
}

impl Related<super::shipment_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentItems.def()
    }
}

impl Related<super::claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
