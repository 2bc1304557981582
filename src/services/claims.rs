//! Claims and the claims CSV report.
//!
//! The report column set and ordering mirror the spreadsheet contract of
//! the original export resource; do not reorder.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Deserialize;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{
    claim, contact, offer, offer_item, organisation, request, request_item, shipment, ItemType,
};
use crate::errors::ServiceError;

pub const REPORT_HEADERS: [&str; 13] = [
    "amount",
    "type",
    "brand",
    "model",
    "shipment",
    "donor_first_name",
    "donor_last_name",
    "donor_email",
    "donor_organisation",
    "requester_first_name",
    "requester_last_name",
    "requester_email",
    "requester_organisation",
];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClaim {
    pub requested_item_id: i32,
    pub offered_item_id: i32,
    pub amount: i32,
    pub shipment_id: Option<i32>,
}

#[derive(Clone)]
pub struct ClaimService {
    db: Arc<DbPool>,
}

impl ClaimService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_claims(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<claim::Model>, u64), ServiceError> {
        let paginator = claim::Entity::find()
            .order_by_desc(claim::Column::CreatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Earmark part of an offered item for a requested item.
    #[instrument(skip(self))]
    pub async fn create_claim(&self, input: CreateClaim) -> Result<claim::Model, ServiceError> {
        if input.amount < 1 {
            return Err(ServiceError::ValidationError(
                "Claim amount must be at least 1".to_string(),
            ));
        }

        let offered = offer_item::Entity::find_by_id(input.offered_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Offered item {} not found",
                    input.offered_item_id
                ))
            })?;
        request_item::Entity::find_by_id(input.requested_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Requested item {} not found",
                    input.requested_item_id
                ))
            })?;

        if input.amount > offered.amount {
            return Err(ServiceError::ValidationError(format!(
                "Claim of {} exceeds the offered amount of {}",
                input.amount, offered.amount
            )));
        }

        let model = claim::ActiveModel {
            requested_item_id: Set(input.requested_item_id),
            offered_item_id: Set(input.offered_item_id),
            amount: Set(input.amount),
            shipment_id: Set(input.shipment_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(claim::Entity::insert(model)
            .exec_with_returning(&*self.db)
            .await?)
    }

    /// Export all claims with donor/requester identity as CSV text.
    #[instrument(skip(self))]
    pub async fn export_report_csv(&self) -> Result<String, ServiceError> {
        let db = &*self.db;
        let claims = claim::Entity::find()
            .order_by_asc(claim::Column::Id)
            .all(db)
            .await?;

        // Resolve the identity joins in bulk; the report is small enough
        // to assemble in memory.
        let offered: HashMap<i32, offer_item::Model> = offer_item::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let requested: HashMap<i32, request_item::Model> = request_item::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let offers: HashMap<i32, offer::Model> = offer::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let requests: HashMap<i32, request::Model> = request::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let contacts: HashMap<i32, contact::Model> = contact::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let organisations: HashMap<i32, organisation::Model> = organisation::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let shipments: HashMap<i32, shipment::Model> = shipment::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let org_name = |contact: Option<&contact::Model>| -> String {
            contact
                .and_then(|c| c.organisation_id)
                .and_then(|id| organisations.get(&id))
                .map(|o| o.name.clone())
                .unwrap_or_default()
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(REPORT_HEADERS)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        for row in claims {
            let offered_item = offered.get(&row.offered_item_id);
            let requested_item = requested.get(&row.requested_item_id);

            let donor = offered_item
                .and_then(|i| offers.get(&i.offer_id))
                .and_then(|o| contacts.get(&o.contact_id));
            let requester = requested_item
                .and_then(|i| requests.get(&i.request_id))
                .and_then(|r| contacts.get(&r.contact_id));

            let item_type = offered_item
                .map(|i| {
                    ItemType::from_str(&i.item_type)
                        .map(|t| t.to_string())
                        .unwrap_or_else(|_| i.item_type.clone())
                })
                .unwrap_or_default();

            let record = [
                row.amount.to_string(),
                item_type,
                offered_item.map(|i| i.brand.clone()).unwrap_or_default(),
                offered_item.map(|i| i.model.clone()).unwrap_or_default(),
                row.shipment_id
                    .and_then(|id| shipments.get(&id))
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                donor.map(|c| c.first_name.clone()).unwrap_or_default(),
                donor.map(|c| c.last_name.clone()).unwrap_or_default(),
                donor.map(|c| c.email.clone()).unwrap_or_default(),
                org_name(donor),
                requester.map(|c| c.first_name.clone()).unwrap_or_default(),
                requester.map(|c| c.last_name.clone()).unwrap_or_default(),
                requester.map(|c| c.email.clone()).unwrap_or_default(),
                org_name(requester),
            ];
            writer
                .write_record(&record)
                .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ServiceError::InternalError(e.to_string()))
    }
}
