//! Location directory.

use std::str::FromStr;
use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{location, LocationKind};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub country: Option<String>,
    pub kind: Option<LocationKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveLocation {
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub kind: String,
    pub managed_by: Option<i32>,
}

#[derive(Clone)]
pub struct LocationService {
    db: Arc<DbPool>,
}

impl LocationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_locations(
        &self,
        filter: LocationFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<location::Model>, u64), ServiceError> {
        let mut query = location::Entity::find();

        if let Some(country) = filter.country {
            query = query.filter(location::Column::Country.eq(country));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(location::Column::Kind.eq(kind.to_string()));
        }

        let paginator = query
            .order_by_asc(location::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_location(&self, location_id: i32) -> Result<location::Model, ServiceError> {
        location::Entity::find_by_id(location_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {location_id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn create_location(
        &self,
        input: SaveLocation,
    ) -> Result<location::Model, ServiceError> {
        let kind = Self::parse_kind(&input.kind)?;

        let model = location::ActiveModel {
            name: Set(input.name),
            city: Set(input.city),
            country: Set(input.country),
            email: Set(input.email),
            phone: Set(input.phone),
            kind: Set(kind.to_string()),
            managed_by: Set(input.managed_by),
            ..Default::default()
        };

        Ok(location::Entity::insert(model)
            .exec_with_returning(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_location(
        &self,
        location_id: i32,
        input: SaveLocation,
    ) -> Result<location::Model, ServiceError> {
        let existing = self.get_location(location_id).await?;
        let kind = Self::parse_kind(&input.kind)?;

        let mut update: location::ActiveModel = existing.into();
        update.name = Set(input.name);
        update.city = Set(input.city);
        update.country = Set(input.country);
        update.email = Set(input.email);
        update.phone = Set(input.phone);
        update.kind = Set(kind.to_string());
        update.managed_by = Set(input.managed_by);

        Ok(location::Entity::update(update).exec(&*self.db).await?)
    }

    fn parse_kind(value: &str) -> Result<LocationKind, ServiceError> {
        LocationKind::from_str(value)
            .map_err(|_| ServiceError::ValidationError(format!("Unknown location kind '{value}'")))
    }
}
