use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Earmarks part of an offered item for a requested item. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "claims")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub requested_item_id: i32,
    pub offered_item_id: i32,
    pub amount: i32,
    pub shipment_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::request_item::Entity",
        from = "Column::RequestedItemId",
        to = "super::request_item::Column::Id"
    )]
    RequestedItem,
    #[sea_orm(
        belongs_to = "super::offer_item::Entity",
        from = "Column::OfferedItemId",
        to = "super::offer_item::Column::Id"
    )]
    OfferedItem,
    #[sea_orm(
        belongs_to = "super::shipment::Entity",
        from = "Column::ShipmentId",
        to = "super::shipment::Column::Id"
    )]
    Shipment,
}

impl Related<super::request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestedItem.def()
    }
}

impl Related<super::offer_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OfferedItem.def()
    }
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
