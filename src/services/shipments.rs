//! Shipment aggregates and the shipment-item ledger read surface.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{location, shipment, shipment_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Default)]
pub struct ShipmentFilter {
    pub is_delivered: Option<bool>,
    pub from_location_id: Option<i32>,
    pub to_location_id: Option<i32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ShipmentItemFilter {
    pub last_location_id: Option<i32>,
    pub shipment_id: Option<i32>,
    pub shipment_is_delivered: Option<bool>,
    pub offered_item_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveShipment {
    pub name: String,
    pub shipment_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub from_location_id: i32,
    pub to_location_id: i32,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct ShipmentService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ShipmentService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Shipments ordered by delivery date, with the original admin's
    /// filter and search fields (name plus either endpoint's name, city
    /// or country).
    #[instrument(skip(self))]
    pub async fn list_shipments(
        &self,
        filter: ShipmentFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<shipment::Model>, u64), ServiceError> {
        let mut query = shipment::Entity::find();

        if let Some(delivered) = filter.is_delivered {
            query = query.filter(shipment::Column::IsDelivered.eq(delivered));
        }
        if let Some(from) = filter.from_location_id {
            query = query.filter(shipment::Column::FromLocationId.eq(from));
        }
        if let Some(to) = filter.to_location_id {
            query = query.filter(shipment::Column::ToLocationId.eq(to));
        }
        if let Some(term) = filter.search.filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let matching_locations: Vec<i32> = location::Entity::find()
                .filter(
                    Condition::any()
                        .add(location::Column::Name.like(pattern.clone()))
                        .add(location::Column::City.like(pattern.clone()))
                        .add(location::Column::Country.like(pattern.clone())),
                )
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|l| l.id)
                .collect();

            query = query.filter(
                Condition::any()
                    .add(shipment::Column::Name.like(pattern))
                    .add(shipment::Column::FromLocationId.is_in(matching_locations.clone()))
                    .add(shipment::Column::ToLocationId.is_in(matching_locations)),
            );
        }

        let paginator = query
            .order_by_asc(shipment::Column::DeliveryDate)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_shipment(
        &self,
        shipment_id: i32,
    ) -> Result<(shipment::Model, Vec<shipment_item::Model>), ServiceError> {
        let row = shipment::Entity::find_by_id(shipment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {shipment_id} not found")))?;

        let items = shipment_item::Entity::find()
            .filter(shipment_item::Column::ShipmentId.eq(shipment_id))
            .order_by_asc(shipment_item::Column::Id)
            .all(&*self.db)
            .await?;

        Ok((row, items))
    }

    #[instrument(skip(self, input))]
    pub async fn create_shipment(
        &self,
        input: SaveShipment,
    ) -> Result<shipment::Model, ServiceError> {
        Self::check_locations(&self.db, input.from_location_id, input.to_location_id).await?;

        let model = shipment::ActiveModel {
            name: Set(input.name),
            shipment_date: Set(input.shipment_date),
            delivery_date: Set(input.delivery_date),
            from_location_id: Set(input.from_location_id),
            to_location_id: Set(input.to_location_id),
            is_delivered: Set(false),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(shipment::Entity::insert(model)
            .exec_with_returning(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_shipment(
        &self,
        shipment_id: i32,
        input: SaveShipment,
    ) -> Result<shipment::Model, ServiceError> {
        let existing = shipment::Entity::find_by_id(shipment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {shipment_id} not found")))?;

        Self::check_locations(&self.db, input.from_location_id, input.to_location_id).await?;

        let mut update: shipment::ActiveModel = existing.into();
        update.name = Set(input.name);
        update.shipment_date = Set(input.shipment_date);
        update.delivery_date = Set(input.delivery_date);
        update.from_location_id = Set(input.from_location_id);
        update.to_location_id = Set(input.to_location_id);
        update.notes = Set(input.notes);

        Ok(shipment::Entity::update(update).exec(&*self.db).await?)
    }

    /// Toggle delivery; downstream item availability follows derived
    /// `is_delivered` on the ledger rows automatically.
    #[instrument(skip(self))]
    pub async fn mark_delivered(
        &self,
        shipment_id: i32,
        delivery_date: Option<NaiveDate>,
    ) -> Result<shipment::Model, ServiceError> {
        let existing = shipment::Entity::find_by_id(shipment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shipment {shipment_id} not found")))?;

        let mut update: shipment::ActiveModel = existing.into();
        update.is_delivered = Set(true);
        if let Some(date) = delivery_date {
            update.delivery_date = Set(Some(date));
        }
        let updated = shipment::Entity::update(update).exec(&*self.db).await?;

        self.event_sender
            .send(Event::ShipmentDelivered { shipment_id })
            .await;

        Ok(updated)
    }

    async fn check_locations(
        db: &DbPool,
        from_location_id: i32,
        to_location_id: i32,
    ) -> Result<(), ServiceError> {
        for id in [from_location_id, to_location_id] {
            location::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Location {id} not found")))?;
        }
        Ok(())
    }

    /// Shipment-item ledger listing, newest first.
    #[instrument(skip(self))]
    pub async fn list_shipment_items(
        &self,
        filter: ShipmentItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<(shipment_item::Model, Option<shipment::Model>)>, u64), ServiceError> {
        let mut query = shipment_item::Entity::find().find_also_related(shipment::Entity);

        if let Some(location) = filter.last_location_id {
            query = query.filter(shipment_item::Column::LastLocationId.eq(location));
        }
        if let Some(shipment_id) = filter.shipment_id {
            query = query.filter(shipment_item::Column::ShipmentId.eq(shipment_id));
        }
        if let Some(offered_item_id) = filter.offered_item_id {
            query = query.filter(shipment_item::Column::OfferedItemId.eq(offered_item_id));
        }
        if let Some(delivered) = filter.shipment_is_delivered {
            query = query.filter(shipment::Column::IsDelivered.eq(delivered));
        }

        let paginator = query
            .order_by_desc(shipment_item::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    /// Full movement history of an offered item, newest first (the
    /// shipment-history inline of the original item view).
    #[instrument(skip(self))]
    pub async fn item_history(
        &self,
        offered_item_id: i32,
    ) -> Result<Vec<shipment_item::Model>, ServiceError> {
        Ok(shipment_item::Entity::find()
            .filter(shipment_item::Column::OfferedItemId.eq(offered_item_id))
            .order_by_desc(shipment_item::Column::When)
            .order_by_desc(shipment_item::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
