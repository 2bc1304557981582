pub mod change;
pub mod claim;
pub mod contact;
pub mod equipment_data;
pub mod location;
pub mod offer;
pub mod offer_item;
pub mod organisation;
pub mod request;
pub mod request_item;
pub mod shipment;
pub mod shipment_item;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Category of an offered or requested item. Stored as lowercase strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemType {
    Hardware,
    Software,
    Service,
    Other,
}

/// What happened to an audited aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeAction {
    Add,
    Change,
    Delete,
}

/// Which aggregate kind a change row refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeType {
    Offer,
    Request,
}

/// Role a location plays in the network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationKind {
    DonorSite,
    RequesterSite,
    Warehouse,
    Other,
}
