//! Offer aggregate and offered-item collection operations.
//!
//! Aggregate saves replace the inline item set in the same transaction
//! that writes the audit row, so a failed log write rolls the domain
//! write back with it.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::Deserialize;
use tracing::instrument;

use crate::auth::access::OwnerCtx;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::{claim, contact, offer, offer_item, ChangeType, ItemType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::changelog;

/// Inline item row of an aggregate save. Rows with an id update the
/// existing item; rows without create one; existing items missing from
/// the set are deleted.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct OfferItemInput {
    pub id: Option<i32>,
    pub item_type: String,
    pub brand: String,
    pub model: String,
    pub amount: i32,
    pub notes: Option<String>,
    #[serde(default)]
    pub received: bool,
    #[serde(default)]
    pub rejected: bool,
    pub claimed_by: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveOffer {
    pub contact_id: i32,
    pub description: String,
    pub location_id: Option<i32>,
    pub delivery_method: Option<String>,
    pub internal_notes: Option<String>,
    pub items: Vec<OfferItemInput>,
}

/// Read-side filters for the offered-item list.
#[derive(Debug, Clone, Default)]
pub struct OfferItemFilter {
    pub item_type: Option<ItemType>,
    pub received: Option<bool>,
    pub brand: Option<String>,
    pub organisation_id: Option<i32>,
    pub offer_id: Option<i32>,
    pub search: Option<String>,
}

/// Offered item annotated with the summed claims against it.
#[derive(Debug, Clone)]
pub struct ClaimedOfferItem {
    pub item: offer_item::Model,
    pub total_claimed: Option<i64>,
}

/// Render the audit snapshot of an offer: description plus one line per
/// item. Opaque text, compared only for equality.
pub fn render_offer(offer_row: &offer::Model, items: &[offer_item::Model]) -> String {
    let mut out = offer_row.description.clone();
    for item in items {
        out.push('\n');
        out.push_str(&item.label());
        if item.received {
            out.push_str(" [received]");
        }
        if item.rejected {
            out.push_str(" [rejected]");
        }
    }
    out
}

fn parse_item_type(value: &str) -> Result<ItemType, ServiceError> {
    ItemType::from_str(value)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown item type '{value}'")))
}

#[derive(Clone)]
pub struct OfferService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl OfferService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Owner context (contact + organisation) of an offer.
    pub async fn owner_ctx(&self, offer_id: i32) -> Result<OwnerCtx, ServiceError> {
        Self::owner_ctx_on(&*self.db, offer_id).await
    }

    async fn owner_ctx_on<C: ConnectionTrait>(
        db: &C,
        offer_id: i32,
    ) -> Result<OwnerCtx, ServiceError> {
        let (offer_row, owner) = offer::Entity::find_by_id(offer_id)
            .find_also_related(contact::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {offer_id} not found")))?;

        let owner = owner.ok_or_else(|| {
            ServiceError::InternalError(format!("Offer {} has no contact", offer_row.id))
        })?;

        Ok(OwnerCtx {
            contact_id: owner.id,
            organisation_id: owner.organisation_id,
        })
    }

    /// List offers, scoped to the actor: superusers see everything, other
    /// users only their own contact's or organisation's offers.
    #[instrument(skip(self, actor))]
    pub async fn list_offers(
        &self,
        actor: &AuthUser,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<offer::Model>, u64), ServiceError> {
        let mut query = offer::Entity::find();

        if !actor.is_superuser {
            let mut scope = Condition::any().add(offer::Column::ContactId.eq(actor.contact_id));
            if let Some(org) = actor.organisation_id {
                let org_contacts: Vec<i32> = contact::Entity::find()
                    .filter(contact::Column::OrganisationId.eq(org))
                    .all(&*self.db)
                    .await?
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                scope = scope.add(offer::Column::ContactId.is_in(org_contacts));
            }
            query = query.filter(scope);
        }

        if let Some(term) = search.filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let matching_offers: Vec<i32> = offer_item::Entity::find()
                .filter(
                    Condition::any()
                        .add(offer_item::Column::Brand.like(pattern.clone()))
                        .add(offer_item::Column::Model.like(pattern.clone()))
                        .add(offer_item::Column::Notes.like(pattern.clone())),
                )
                .select_only()
                .column(offer_item::Column::OfferId)
                .distinct()
                .into_tuple()
                .all(&*self.db)
                .await?;

            query = query.filter(
                Condition::any()
                    .add(offer::Column::Description.like(pattern))
                    .add(offer::Column::Id.is_in(matching_offers)),
            );
        }

        let paginator = query
            .order_by_desc(offer::Column::UpdatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_offer(
        &self,
        offer_id: i32,
    ) -> Result<(offer::Model, Vec<offer_item::Model>), ServiceError> {
        let offer_row = offer::Entity::find_by_id(offer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {offer_id} not found")))?;

        let items = offer_item::Entity::find()
            .filter(offer_item::Column::OfferId.eq(offer_id))
            .order_by_asc(offer_item::Column::Id)
            .all(&*self.db)
            .await?;

        Ok((offer_row, items))
    }

    /// Create an offer with its items; writes the audit row (action=add)
    /// in the same transaction.
    #[instrument(skip(self, actor, input))]
    pub async fn create_offer(
        &self,
        actor: &AuthUser,
        input: SaveOffer,
    ) -> Result<offer::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let offer_row = offer::ActiveModel {
            contact_id: Set(input.contact_id),
            description: Set(input.description.clone()),
            location_id: Set(input.location_id),
            delivery_method: Set(input.delivery_method.clone()),
            internal_notes: Set(input.internal_notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let offer_row = offer::Entity::insert(offer_row)
            .exec_with_returning(&txn)
            .await?;

        let items = Self::apply_items(&txn, offer_row.id, &input.items, &[]).await?;

        let after = render_offer(&offer_row, &items);
        changelog::record_saved(
            &txn,
            actor.contact_id,
            ChangeType::Offer,
            true,
            &offer_row.description,
            "",
            &after,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::OfferSaved {
                offer_id: offer_row.id,
                created: true,
            })
            .await;

        Ok(offer_row)
    }

    /// Update an offer and its inline items; the audit row (action=change)
    /// is only written when the rendered snapshots differ.
    #[instrument(skip(self, actor, input))]
    pub async fn update_offer(
        &self,
        actor: &AuthUser,
        offer_id: i32,
        input: SaveOffer,
    ) -> Result<offer::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = offer::Entity::find_by_id(offer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {offer_id} not found")))?;
        let existing_items = offer_item::Entity::find()
            .filter(offer_item::Column::OfferId.eq(offer_id))
            .order_by_asc(offer_item::Column::Id)
            .all(&txn)
            .await?;

        let before = render_offer(&existing, &existing_items);

        let mut update: offer::ActiveModel = existing.into();
        update.contact_id = Set(input.contact_id);
        update.description = Set(input.description.clone());
        update.location_id = Set(input.location_id);
        update.delivery_method = Set(input.delivery_method.clone());
        update.internal_notes = Set(input.internal_notes.clone());
        update.updated_at = Set(Utc::now());
        let updated = offer::Entity::update(update).exec(&txn).await?;

        let items = Self::apply_items(&txn, offer_id, &input.items, &existing_items).await?;

        let after = render_offer(&updated, &items);
        changelog::record_saved(
            &txn,
            actor.contact_id,
            ChangeType::Offer,
            false,
            &updated.description,
            &before,
            &after,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::OfferSaved {
                offer_id,
                created: false,
            })
            .await;

        Ok(updated)
    }

    /// Delete an offer and its items; always writes an audit row with an
    /// empty after snapshot.
    #[instrument(skip(self, actor))]
    pub async fn delete_offer(&self, actor: &AuthUser, offer_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = offer::Entity::find_by_id(offer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offer {offer_id} not found")))?;
        let existing_items = offer_item::Entity::find()
            .filter(offer_item::Column::OfferId.eq(offer_id))
            .all(&txn)
            .await?;

        let before = render_offer(&existing, &existing_items);

        offer_item::Entity::delete_many()
            .filter(offer_item::Column::OfferId.eq(offer_id))
            .exec(&txn)
            .await?;
        offer::Entity::delete_by_id(offer_id).exec(&txn).await?;

        changelog::record_deleted(
            &txn,
            actor.contact_id,
            ChangeType::Offer,
            &existing.description,
            &before,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::OfferDeleted { offer_id })
            .await;

        Ok(())
    }

    /// Reconcile the stored item set with the submitted one (the inline
    /// formset semantics of the original admin).
    async fn apply_items<C: ConnectionTrait>(
        db: &C,
        offer_id: i32,
        inputs: &[OfferItemInput],
        existing: &[offer_item::Model],
    ) -> Result<Vec<offer_item::Model>, ServiceError> {
        let now = Utc::now();
        let existing_ids: HashSet<i32> = existing.iter().map(|i| i.id).collect();
        let kept: HashSet<i32> = inputs.iter().filter_map(|i| i.id).collect();

        for input in inputs {
            parse_item_type(&input.item_type)?;
            if input.amount < 1 {
                return Err(ServiceError::ValidationError(
                    "Item amount must be at least 1".to_string(),
                ));
            }
        }

        let stale: Vec<i32> = existing_ids.difference(&kept).copied().collect();
        if !stale.is_empty() {
            offer_item::Entity::delete_many()
                .filter(offer_item::Column::Id.is_in(stale))
                .exec(db)
                .await?;
        }

        for input in inputs {
            match input.id {
                Some(id) => {
                    if !existing_ids.contains(&id) {
                        return Err(ServiceError::ValidationError(format!(
                            "Item {id} does not belong to offer {offer_id}"
                        )));
                    }
                    let model = offer_item::ActiveModel {
                        id: Set(id),
                        offer_id: Set(offer_id),
                        item_type: Set(input.item_type.clone()),
                        brand: Set(input.brand.clone()),
                        model: Set(input.model.clone()),
                        amount: Set(input.amount),
                        notes: Set(input.notes.clone()),
                        received: Set(input.received),
                        rejected: Set(input.rejected),
                        claimed_by: Set(input.claimed_by),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    offer_item::Entity::update(model).exec(db).await?;
                }
                None => {
                    let model = offer_item::ActiveModel {
                        offer_id: Set(offer_id),
                        item_type: Set(input.item_type.clone()),
                        brand: Set(input.brand.clone()),
                        model: Set(input.model.clone()),
                        amount: Set(input.amount),
                        notes: Set(input.notes.clone()),
                        received: Set(input.received),
                        rejected: Set(input.rejected),
                        claimed_by: Set(input.claimed_by),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    offer_item::Entity::insert(model).exec(db).await?;
                }
            }
        }

        Ok(offer_item::Entity::find()
            .filter(offer_item::Column::OfferId.eq(offer_id))
            .order_by_asc(offer_item::Column::Id)
            .all(db)
            .await?)
    }

    /// Offered-item list with the claimed-sum annotation.
    #[instrument(skip(self))]
    pub async fn list_offer_items(
        &self,
        filter: OfferItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ClaimedOfferItem>, u64), ServiceError> {
        let mut query = offer_item::Entity::find();

        if let Some(item_type) = filter.item_type {
            query = query.filter(offer_item::Column::ItemType.eq(item_type.to_string()));
        }
        if let Some(received) = filter.received {
            query = query.filter(offer_item::Column::Received.eq(received));
        }
        if let Some(brand) = filter.brand {
            query = query.filter(offer_item::Column::Brand.eq(brand));
        }
        if let Some(offer_id) = filter.offer_id {
            query = query.filter(offer_item::Column::OfferId.eq(offer_id));
        }
        if let Some(org) = filter.organisation_id {
            let org_contacts: Vec<i32> = contact::Entity::find()
                .filter(contact::Column::OrganisationId.eq(org))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            let org_offers: Vec<i32> = offer::Entity::find()
                .filter(offer::Column::ContactId.is_in(org_contacts))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|o| o.id)
                .collect();
            query = query.filter(offer_item::Column::OfferId.is_in(org_offers));
        }
        if let Some(term) = filter.search.filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            query = query.filter(
                Condition::any()
                    .add(offer_item::Column::Brand.like(pattern.clone()))
                    .add(offer_item::Column::Model.like(pattern.clone()))
                    .add(offer_item::Column::Notes.like(pattern)),
            );
        }

        let paginator = query
            .order_by_asc(offer_item::Column::Brand)
            .order_by_asc(offer_item::Column::Model)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        // Claimed sums, grouped in one query rather than per row.
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        #[derive(sea_orm::FromQueryResult)]
        struct ClaimSum {
            key: i32,
            total: i64,
        }
        let sums: HashMap<i32, i64> = claim::Entity::find()
            .select_only()
            .column_as(claim::Column::OfferedItemId, "key")
            .column_as(Expr::col(claim::Column::Amount).sum(), "total")
            .filter(claim::Column::OfferedItemId.is_in(ids))
            .group_by(claim::Column::OfferedItemId)
            .into_model::<ClaimSum>()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|s| (s.key, s.total))
            .collect();

        let annotated = rows
            .into_iter()
            .map(|item| {
                let total_claimed = sums.get(&item.id).copied();
                ClaimedOfferItem {
                    item,
                    total_claimed,
                }
            })
            .collect();

        Ok((annotated, total))
    }

    #[instrument(skip(self))]
    pub async fn get_offer_item(&self, item_id: i32) -> Result<offer_item::Model, ServiceError> {
        offer_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offered item {item_id} not found")))
    }

    /// Bulk action: set the type tag on a selection of items.
    #[instrument(skip(self))]
    pub async fn set_item_type(
        &self,
        item_ids: &[i32],
        item_type: ItemType,
    ) -> Result<u64, ServiceError> {
        let result = offer_item::Entity::update_many()
            .col_expr(
                offer_item::Column::ItemType,
                Expr::value(item_type.to_string()),
            )
            .col_expr(offer_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(offer_item::Column::Id.is_in(item_ids.to_vec()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Bulk action: move a selection of items to another offer.
    #[instrument(skip(self))]
    pub async fn move_items_to_offer(
        &self,
        item_ids: &[i32],
        target_offer_id: i32,
    ) -> Result<u64, ServiceError> {
        offer::Entity::find_by_id(target_offer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Offer {target_offer_id} not found"))
            })?;

        let result = offer_item::Entity::update_many()
            .col_expr(offer_item::Column::OfferId, Expr::value(target_offer_id))
            .col_expr(offer_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(offer_item::Column::Id.is_in(item_ids.to_vec()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
