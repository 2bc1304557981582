use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog entry describing the physical specs of a (brand, model) pair.
/// Populated through CSV bulk import; brand+model is the import key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "equipment_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub brand: String,
    pub model: String,
    /// Centimetres.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub width: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub height: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub depth: Option<Decimal>,
    /// Kilograms.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub weight: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
