//! Inventory ledger and the shipment assignment workflow.
//!
//! Availability is a pure read-side aggregation over the append-only
//! `shipment_items` ledger and is recomputed on every query. Two levels
//! exist: per ledger row (`amount` minus the sum of child rows chained via
//! `parent_shipment_item`) and per offered item (`amount` minus the sum of
//! its root ledger rows). The assignable pool contains ledger rows with
//! positive availability; the intake pool contains offered items with
//! positive unshipped quantity.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::{offer_item, shipment, shipment_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// User-facing rejection messages of the selection phase.
pub const MSG_INCONSISTENT_LOCATION: &str = "Chosen items are in different locations.";
pub const MSG_UNDELIVERED_PREDECESSOR: &str =
    "Some of items are not delivered yet or attached to another shipment.";

/// A ledger row of the assignable pool, annotated with its remaining
/// availability.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailableItem {
    pub id: i32,
    pub offered_item_id: i32,
    pub brand: String,
    pub model: String,
    pub amount: i32,
    /// Sum of child rows drawing from this one.
    pub sent: i64,
    pub available: i64,
    pub last_location_id: i32,
    pub shipment_id: Option<i32>,
    pub is_delivered: bool,
    pub parent_shipment_item: Option<i32>,
}

/// An offered item of the intake pool, annotated with its unshipped
/// quantity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IntakeItem {
    pub offered_item_id: i32,
    pub brand: String,
    pub model: String,
    pub amount: i32,
    /// Sum of root ledger rows drawing from the offered item.
    pub shipped: i64,
    pub available: i64,
}

/// One row of a confirmed assignment: ledger row plus the staff-chosen
/// amount to move.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentLine {
    pub item_id: i32,
    pub amount: i32,
}

/// Result of the selection-phase validation: the shared origin and the
/// shipments that may serve as target.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidatedSelection {
    pub last_location_id: i32,
    pub eligible_shipments: Vec<shipment::Model>,
}

#[derive(FromQueryResult)]
struct GroupedSum {
    key: i32,
    total: i64,
}

/// Remaining quantity once `sent` of `amount` has been dispatched.
pub fn remaining(amount: i32, sent: i64) -> i64 {
    i64::from(amount) - sent
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Sum of child-row amounts grouped by parent ledger row.
    async fn sent_by_parent<C: ConnectionTrait>(
        db: &C,
    ) -> Result<HashMap<i32, i64>, ServiceError> {
        let sums = shipment_item::Entity::find()
            .select_only()
            .column_as(shipment_item::Column::ParentShipmentItem, "key")
            .column_as(Expr::col(shipment_item::Column::Amount).sum(), "total")
            .filter(shipment_item::Column::ParentShipmentItem.is_not_null())
            .group_by(shipment_item::Column::ParentShipmentItem)
            .into_model::<GroupedSum>()
            .all(db)
            .await?;

        Ok(sums.into_iter().map(|s| (s.key, s.total)).collect())
    }

    /// Sum of root-row amounts grouped by offered item.
    async fn shipped_by_offer_item<C: ConnectionTrait>(
        db: &C,
    ) -> Result<HashMap<i32, i64>, ServiceError> {
        let sums = shipment_item::Entity::find()
            .select_only()
            .column_as(shipment_item::Column::OfferedItemId, "key")
            .column_as(Expr::col(shipment_item::Column::Amount).sum(), "total")
            .filter(shipment_item::Column::ParentShipmentItem.is_null())
            .group_by(shipment_item::Column::OfferedItemId)
            .into_model::<GroupedSum>()
            .all(db)
            .await?;

        Ok(sums.into_iter().map(|s| (s.key, s.total)).collect())
    }

    /// The assignable pool: ledger rows with positive availability.
    #[instrument(skip(self))]
    pub async fn list_available_items(
        &self,
        location_id: Option<i32>,
    ) -> Result<Vec<AvailableItem>, ServiceError> {
        let db = &*self.db;
        let sent = Self::sent_by_parent(db).await?;

        let mut query = shipment_item::Entity::find().find_also_related(shipment::Entity);
        if let Some(location) = location_id {
            query = query.filter(shipment_item::Column::LastLocationId.eq(location));
        }
        let rows = query.all(db).await?;

        let offered_ids: Vec<i32> = rows.iter().map(|(r, _)| r.offered_item_id).collect();
        let offered: HashMap<i32, offer_item::Model> = offer_item::Entity::find()
            .filter(offer_item::Column::Id.is_in(offered_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut pool = Vec::new();
        for (row, shipment) in rows {
            let row_sent = sent.get(&row.id).copied().unwrap_or(0);
            let available = remaining(row.amount, row_sent);
            if available < 0 {
                // An over-commitment slipped past the assignment guard;
                // surface it instead of silently hiding the row.
                warn!(
                    shipment_item_id = row.id,
                    available, "negative availability on ledger row"
                );
            }
            if available <= 0 {
                continue;
            }

            let (brand, model) = offered
                .get(&row.offered_item_id)
                .map(|o| (o.brand.clone(), o.model.clone()))
                .unwrap_or_default();

            pool.push(AvailableItem {
                id: row.id,
                offered_item_id: row.offered_item_id,
                brand,
                model,
                amount: row.amount,
                sent: row_sent,
                available,
                last_location_id: row.last_location_id,
                shipment_id: row.shipment_id,
                is_delivered: shipment.as_ref().map(|s| s.is_delivered).unwrap_or(false),
                parent_shipment_item: row.parent_shipment_item,
            });
        }

        Ok(pool)
    }

    /// The intake pool: offered items with unshipped quantity left.
    #[instrument(skip(self))]
    pub async fn list_intake_pool(&self) -> Result<Vec<IntakeItem>, ServiceError> {
        let db = &*self.db;
        let shipped = Self::shipped_by_offer_item(db).await?;

        let items = offer_item::Entity::find()
            .filter(offer_item::Column::Rejected.eq(false))
            .all(db)
            .await?;

        let mut pool = Vec::new();
        for item in items {
            let item_shipped = shipped.get(&item.id).copied().unwrap_or(0);
            let available = remaining(item.amount, item_shipped);
            if available < 0 {
                warn!(
                    offer_item_id = item.id,
                    available, "negative availability on offered item"
                );
            }
            if available <= 0 {
                continue;
            }
            pool.push(IntakeItem {
                offered_item_id: item.id,
                brand: item.brand,
                model: item.model,
                amount: item.amount,
                shipped: item_shipped,
                available,
            });
        }

        Ok(pool)
    }

    /// Unshipped quantity of a single offered item.
    #[instrument(skip(self))]
    pub async fn offer_item_availability(&self, offer_item_id: i32) -> Result<i64, ServiceError> {
        Self::offer_item_availability_on(&*self.db, offer_item_id).await
    }

    async fn offer_item_availability_on<C: ConnectionTrait>(
        db: &C,
        offer_item_id: i32,
    ) -> Result<i64, ServiceError> {
        let item = offer_item::Entity::find_by_id(offer_item_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Offered item {offer_item_id} not found"))
            })?;

        let shipped: Option<i64> = shipment_item::Entity::find()
            .select_only()
            .column_as(Expr::col(shipment_item::Column::Amount).sum(), "total")
            .filter(shipment_item::Column::OfferedItemId.eq(offer_item_id))
            .filter(shipment_item::Column::ParentShipmentItem.is_null())
            .into_tuple()
            .one(db)
            .await?
            .flatten();

        Ok(remaining(item.amount, shipped.unwrap_or(0)))
    }

    async fn row_availability_on<C: ConnectionTrait>(
        db: &C,
        row: &shipment_item::Model,
    ) -> Result<i64, ServiceError> {
        let sent: Option<i64> = shipment_item::Entity::find()
            .select_only()
            .column_as(Expr::col(shipment_item::Column::Amount).sum(), "total")
            .filter(shipment_item::Column::ParentShipmentItem.eq(row.id))
            .into_tuple()
            .one(db)
            .await?
            .flatten();

        Ok(remaining(row.amount, sent.unwrap_or(0)))
    }

    /// Selection-phase checks over a set of ledger rows. Collects every
    /// failure so staff can correct the whole selection at once.
    async fn check_selection<C: ConnectionTrait>(
        db: &C,
        item_ids: &[i32],
    ) -> Result<(Vec<shipment_item::Model>, i32), Vec<String>> {
        let mut errors = Vec::new();

        if item_ids.is_empty() {
            return Err(vec!["No items selected.".to_string()]);
        }

        let rows = shipment_item::Entity::find()
            .filter(shipment_item::Column::Id.is_in(item_ids.to_vec()))
            .find_also_related(shipment::Entity)
            .all(db)
            .await
            .map_err(|e| vec![format!("Database error: {e}")])?;

        let found: HashSet<i32> = rows.iter().map(|(r, _)| r.id).collect();
        for id in item_ids {
            if !found.contains(id) {
                errors.push(format!("Item {id} does not exist."));
            }
        }

        let locations: HashSet<i32> = rows.iter().map(|(r, _)| r.last_location_id).collect();
        if locations.len() > 1 {
            errors.push(MSG_INCONSISTENT_LOCATION.to_string());
        }

        let undelivered = rows
            .iter()
            .any(|(_, s)| matches!(s, Some(s) if !s.is_delivered));
        if undelivered {
            errors.push(MSG_UNDELIVERED_PREDECESSOR.to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let location = locations
            .into_iter()
            .next()
            .expect("non-empty selection has a location");
        Ok((rows.into_iter().map(|(r, _)| r).collect(), location))
    }

    /// Selection → confirmation transition: validate the selection and
    /// return the candidate target shipments.
    #[instrument(skip(self))]
    pub async fn validate_selection(
        &self,
        item_ids: &[i32],
    ) -> Result<ValidatedSelection, ServiceError> {
        let db = &*self.db;

        let (_, location) = Self::check_selection(db, item_ids)
            .await
            .map_err(ServiceError::WorkflowRejected)?;

        let eligible_shipments = shipment::Entity::find()
            .filter(shipment::Column::FromLocationId.eq(location))
            .all(db)
            .await?;

        Ok(ValidatedSelection {
            last_location_id: location,
            eligible_shipments,
        })
    }

    /// Confirmation phase: re-validate and commit the whole batch in one
    /// transaction, re-checking availability per row inside it.
    #[instrument(skip(self))]
    pub async fn assign_to_shipment(
        &self,
        shipment_id: i32,
        lines: &[AssignmentLine],
    ) -> Result<Vec<shipment_item::Model>, ServiceError> {
        let txn = self.db.begin().await?;

        let target = shipment::Entity::find_by_id(shipment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {shipment_id} not found")))?;

        let ids: Vec<i32> = lines.iter().map(|l| l.item_id).collect();
        let (rows, location) = Self::check_selection(&txn, &ids)
            .await
            .map_err(ServiceError::WorkflowRejected)?;

        if target.from_location_id != location {
            return Err(ServiceError::WorkflowRejected(vec![format!(
                "Shipment '{}' does not depart from the items' location.",
                target.name
            )]));
        }

        let by_id: HashMap<i32, &shipment_item::Model> =
            rows.iter().map(|r| (r.id, r)).collect();

        let mut created = Vec::with_capacity(lines.len());
        for line in lines {
            if line.amount < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Amount for item {} must be at least 1",
                    line.item_id
                )));
            }

            let row = by_id[&line.item_id];
            let available = Self::row_availability_on(&txn, row).await?;
            if i64::from(line.amount) > available {
                return Err(ServiceError::InsufficientAvailability(format!(
                    "Item {} has {} available, {} requested",
                    line.item_id, available, line.amount
                )));
            }

            let model = shipment_item::ActiveModel {
                shipment_id: Set(Some(target.id)),
                offered_item_id: Set(row.offered_item_id),
                amount: Set(line.amount),
                last_location_id: Set(target.from_location_id),
                parent_shipment_item: Set(Some(row.id)),
                when: Set(target.shipment_date),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            created.push(shipment_item::Entity::insert(model).exec_with_returning(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::ItemsAssigned {
                shipment_id: target.id,
                item_count: created.len(),
            })
            .await;

        Ok(created)
    }

    /// Create a root ledger row drawing from an offered item's unshipped
    /// quantity, either parked at a location or directly on a shipment.
    #[instrument(skip(self))]
    pub async fn intake_offer_item(
        &self,
        offer_item_id: i32,
        amount: i32,
        shipment_id: Option<i32>,
        location_id: Option<i32>,
    ) -> Result<shipment_item::Model, ServiceError> {
        if amount < 1 {
            return Err(ServiceError::ValidationError(
                "Amount must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let available = Self::offer_item_availability_on(&txn, offer_item_id).await?;
        if i64::from(amount) > available {
            return Err(ServiceError::InsufficientAvailability(format!(
                "Offered item {offer_item_id} has {available} available, {amount} requested"
            )));
        }

        let (shipment_id, last_location, when) = match shipment_id {
            Some(id) => {
                let target = shipment::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Shipment {id} not found")))?;
                (Some(target.id), target.from_location_id, target.shipment_date)
            }
            None => {
                let location = location_id.ok_or_else(|| {
                    ServiceError::ValidationError(
                        "Either a shipment or a location is required".to_string(),
                    )
                })?;
                (None, location, None)
            }
        };

        let model = shipment_item::ActiveModel {
            shipment_id: Set(shipment_id),
            offered_item_id: Set(offer_item_id),
            amount: Set(amount),
            last_location_id: Set(last_location),
            parent_shipment_item: Set(None),
            when: Set(when),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let created = shipment_item::Entity::insert(model)
            .exec_with_returning(&txn)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::ItemIntake {
                offered_item_id: offer_item_id,
                amount,
            })
            .await;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_with_no_children_equals_amount() {
        assert_eq!(remaining(10, 0), 10);
    }

    #[test]
    fn remaining_subtracts_children_sum() {
        assert_eq!(remaining(10, 3), 7);
        assert_eq!(remaining(10, 10), 0);
    }

    #[test]
    fn remaining_can_go_negative_and_is_not_clamped() {
        // An over-commitment must surface as a negative figure, not be
        // masked as zero.
        assert_eq!(remaining(5, 8), -3);
    }
}
