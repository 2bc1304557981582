use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Append-only ledger row: a quantity of an offered item moved (or parked)
/// at a location. Rows are never mutated after creation; partial
/// re-shipments chain through `parent_shipment_item`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "shipment_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unassigned rows (not yet on a transport leg) have no shipment.
    pub shipment_id: Option<i32>,
    pub offered_item_id: i32,
    pub amount: i32,
    pub last_location_id: i32,
    pub parent_shipment_item: Option<i32>,
    pub when: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipment::Entity",
        from = "Column::ShipmentId",
        to = "super::shipment::Column::Id"
    )]
    Shipment,
    #[sea_orm(
        belongs_to = "super::offer_item::Entity",
        from = "Column::OfferedItemId",
        to = "super::offer_item::Column::Id"
    )]
    OfferedItem,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LastLocationId",
        to = "super::location::Column::Id"
    )]
    LastLocation,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentShipmentItem",
        to = "Column::Id"
    )]
    Parent,
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipment.def()
    }
}

impl Related<super::offer_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OfferedItem.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LastLocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
