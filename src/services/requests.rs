//! Request aggregate and requested-item collection operations.
//!
//! Requested items can chain same-request alternatives through
//! `alternative_for`. The stored data is never trusted to be acyclic:
//! writes reject cycles, and the rendering walk carries a visited set so
//! pre-existing cyclic data still renders finitely.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::Deserialize;
use tracing::instrument;

use crate::auth::access::OwnerCtx;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::{contact, request, request_item, ChangeType, ItemType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::changelog;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RequestItemInput {
    pub id: Option<i32>,
    pub item_type: String,
    pub brand: String,
    pub model: String,
    pub amount: i32,
    #[serde(default)]
    pub up_to: bool,
    pub notes: Option<String>,
    pub alternative_for: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    pub contact_id: i32,
    pub goal: String,
    pub description: Option<String>,
    pub internal_notes: Option<String>,
    pub items: Vec<RequestItemInput>,
}

/// Read-side filters for the requested-item list.
#[derive(Debug, Clone, Default)]
pub struct RequestItemFilter {
    pub item_type: Option<ItemType>,
    pub brand: Option<String>,
    pub organisation_id: Option<i32>,
    pub request_id: Option<i32>,
    pub search: Option<String>,
}

/// Render the "A or B or C" item summary of a request. Top-level items
/// (no `alternative_for`) each start a line; alternatives chain behind
/// them. The visited set keeps the walk finite on cyclic data.
pub fn render_item_lines(items: &[request_item::Model]) -> Vec<String> {
    let mut children: HashMap<i32, Vec<&request_item::Model>> = HashMap::new();
    for item in items {
        if let Some(parent) = item.alternative_for {
            children.entry(parent).or_default().push(item);
        }
    }

    fn walk(
        item: &request_item::Model,
        children: &HashMap<i32, Vec<&request_item::Model>>,
        visited: &mut HashSet<i32>,
        out: &mut String,
    ) {
        if !visited.insert(item.id) {
            return;
        }
        for alt in children.get(&item.id).into_iter().flatten() {
            out.push_str(" or ");
            out.push_str(&alt.label());
            walk(alt, children, visited, out);
        }
    }

    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    for item in items.iter().filter(|i| i.alternative_for.is_none()) {
        let mut line = item.label();
        walk(item, &children, &mut visited, &mut line);
        lines.push(line);
    }
    lines
}

/// Render the audit snapshot of a request: goal plus the item summary.
pub fn render_request(request_row: &request::Model, items: &[request_item::Model]) -> String {
    let mut out = request_row.goal.clone();
    for line in render_item_lines(items) {
        out.push('\n');
        out.push_str(&line);
    }
    out
}

fn parse_item_type(value: &str) -> Result<ItemType, ServiceError> {
    ItemType::from_str(value)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown item type '{value}'")))
}

#[derive(Clone)]
pub struct RequestService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl RequestService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Owner context (contact + organisation) of a request.
    pub async fn owner_ctx(&self, request_id: i32) -> Result<OwnerCtx, ServiceError> {
        let (request_row, owner) = request::Entity::find_by_id(request_id)
            .find_also_related(contact::Entity)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {request_id} not found")))?;

        let owner = owner.ok_or_else(|| {
            ServiceError::InternalError(format!("Request {} has no contact", request_row.id))
        })?;

        Ok(OwnerCtx {
            contact_id: owner.id,
            organisation_id: owner.organisation_id,
        })
    }

    /// List requests, scoped to the actor like the offer list.
    #[instrument(skip(self, actor))]
    pub async fn list_requests(
        &self,
        actor: &AuthUser,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<request::Model>, u64), ServiceError> {
        let mut query = request::Entity::find();

        if !actor.is_superuser {
            let mut scope = Condition::any().add(request::Column::ContactId.eq(actor.contact_id));
            if let Some(org) = actor.organisation_id {
                let org_contacts: Vec<i32> = contact::Entity::find()
                    .filter(contact::Column::OrganisationId.eq(org))
                    .all(&*self.db)
                    .await?
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                scope = scope.add(request::Column::ContactId.is_in(org_contacts));
            }
            query = query.filter(scope);
        }

        if let Some(term) = search.filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let matching: Vec<i32> = request_item::Entity::find()
                .filter(
                    Condition::any()
                        .add(request_item::Column::Brand.like(pattern.clone()))
                        .add(request_item::Column::Model.like(pattern.clone()))
                        .add(request_item::Column::Notes.like(pattern.clone())),
                )
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|i| i.request_id)
                .collect();

            query = query.filter(
                Condition::any()
                    .add(request::Column::Goal.like(pattern.clone()))
                    .add(request::Column::Description.like(pattern))
                    .add(request::Column::Id.is_in(matching)),
            );
        }

        let paginator = query
            .order_by_desc(request::Column::UpdatedAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_request(
        &self,
        request_id: i32,
    ) -> Result<(request::Model, Vec<request_item::Model>), ServiceError> {
        let request_row = request::Entity::find_by_id(request_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {request_id} not found")))?;

        let items = request_item::Entity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .order_by_asc(request_item::Column::Id)
            .all(&*self.db)
            .await?;

        Ok((request_row, items))
    }

    #[instrument(skip(self, actor, input))]
    pub async fn create_request(
        &self,
        actor: &AuthUser,
        input: SaveRequest,
    ) -> Result<request::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let request_row = request::ActiveModel {
            contact_id: Set(input.contact_id),
            goal: Set(input.goal.clone()),
            description: Set(input.description.clone()),
            internal_notes: Set(input.internal_notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let request_row = request::Entity::insert(request_row)
            .exec_with_returning(&txn)
            .await?;

        let items = Self::apply_items(&txn, request_row.id, &input.items, &[]).await?;

        let after = render_request(&request_row, &items);
        changelog::record_saved(
            &txn,
            actor.contact_id,
            ChangeType::Request,
            true,
            &request_row.goal,
            "",
            &after,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::RequestSaved {
                request_id: request_row.id,
                created: true,
            })
            .await;

        Ok(request_row)
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_request(
        &self,
        actor: &AuthUser,
        request_id: i32,
        input: SaveRequest,
    ) -> Result<request::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = request::Entity::find_by_id(request_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {request_id} not found")))?;
        let existing_items = request_item::Entity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .order_by_asc(request_item::Column::Id)
            .all(&txn)
            .await?;

        let before = render_request(&existing, &existing_items);

        let mut update: request::ActiveModel = existing.into();
        update.contact_id = Set(input.contact_id);
        update.goal = Set(input.goal.clone());
        update.description = Set(input.description.clone());
        update.internal_notes = Set(input.internal_notes.clone());
        update.updated_at = Set(Utc::now());
        let updated = request::Entity::update(update).exec(&txn).await?;

        let items = Self::apply_items(&txn, request_id, &input.items, &existing_items).await?;

        let after = render_request(&updated, &items);
        changelog::record_saved(
            &txn,
            actor.contact_id,
            ChangeType::Request,
            false,
            &updated.goal,
            &before,
            &after,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::RequestSaved {
                request_id,
                created: false,
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_request(
        &self,
        actor: &AuthUser,
        request_id: i32,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = request::Entity::find_by_id(request_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {request_id} not found")))?;
        let existing_items = request_item::Entity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .all(&txn)
            .await?;

        let before = render_request(&existing, &existing_items);

        request_item::Entity::delete_many()
            .filter(request_item::Column::RequestId.eq(request_id))
            .exec(&txn)
            .await?;
        request::Entity::delete_by_id(request_id).exec(&txn).await?;

        changelog::record_deleted(
            &txn,
            actor.contact_id,
            ChangeType::Request,
            &existing.goal,
            &before,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::RequestDeleted { request_id })
            .await;

        Ok(())
    }

    /// Reject an `alternative_for` reference that is self-referential,
    /// crosses requests, or closes a cycle.
    fn check_alternative_chain(
        item_id: Option<i32>,
        target: i32,
        items_by_id: &HashMap<i32, Option<i32>>,
    ) -> Result<(), ServiceError> {
        if item_id == Some(target) {
            return Err(ServiceError::ValidationError(
                "An item cannot be an alternative for itself".to_string(),
            ));
        }
        if !items_by_id.contains_key(&target) {
            return Err(ServiceError::ValidationError(format!(
                "Alternative target {target} is not an item of this request"
            )));
        }

        // Walk the parent chain from the target; hitting the item being
        // saved (or revisiting a node) would close a cycle.
        let mut visited = HashSet::new();
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if Some(current) == item_id || !visited.insert(current) {
                return Err(ServiceError::ValidationError(
                    "Alternative references must not form a cycle".to_string(),
                ));
            }
            cursor = items_by_id.get(&current).copied().flatten();
        }

        Ok(())
    }

    async fn apply_items<C: ConnectionTrait>(
        db: &C,
        request_id: i32,
        inputs: &[RequestItemInput],
        existing: &[request_item::Model],
    ) -> Result<Vec<request_item::Model>, ServiceError> {
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
            request_item::Entity::delete_many()
                .filter(request_item::Column::Id.is_in(stale))
                .exec(db)
                .await?;
        }

        // First pass: upsert rows without alternative links so new rows
        // get ids the second pass can point at.
        let mut saved_ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            match input.id {
                Some(id) => {
                    if !existing_ids.contains(&id) {
                        return Err(ServiceError::ValidationError(format!(
                            "Item {id} does not belong to request {request_id}"
                        )));
                    }
                    let model = request_item::ActiveModel {
                        id: Set(id),
                        request_id: Set(request_id),
                        item_type: Set(input.item_type.clone()),
                        brand: Set(input.brand.clone()),
                        model: Set(input.model.clone()),
                        amount: Set(input.amount),
                        up_to: Set(input.up_to),
                        notes: Set(input.notes.clone()),
                        alternative_for: Set(None),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    request_item::Entity::update(model).exec(db).await?;
                    saved_ids.push(id);
                }
                None => {
                    let model = request_item::ActiveModel {
                        request_id: Set(request_id),
                        item_type: Set(input.item_type.clone()),
                        brand: Set(input.brand.clone()),
                        model: Set(input.model.clone()),
                        amount: Set(input.amount),
                        up_to: Set(input.up_to),
                        notes: Set(input.notes.clone()),
                        alternative_for: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    let inserted = request_item::Entity::insert(model)
                        .exec_with_returning(db)
                        .await?;
                    saved_ids.push(inserted.id);
                }
            }
        }

        // Second pass: wire the alternative links, positions resolved
        // against the saved rows, cycles rejected.
        let mut links: HashMap<i32, Option<i32>> =
            saved_ids.iter().map(|id| (*id, None)).collect();
        for (input, item_id) in inputs.iter().zip(saved_ids.iter()) {
            if let Some(target) = input.alternative_for {
                Self::check_alternative_chain(Some(*item_id), target, &links)?;
                links.insert(*item_id, Some(target));
                let model = request_item::ActiveModel {
                    id: Set(*item_id),
                    alternative_for: Set(Some(target)),
                    ..Default::default()
                };
                request_item::Entity::update(model).exec(db).await?;
            }
        }

        Ok(request_item::Entity::find()
            .filter(request_item::Column::RequestId.eq(request_id))
            .order_by_asc(request_item::Column::Id)
            .all(db)
            .await?)
    }

    /// Requested-item list.
    #[instrument(skip(self))]
    pub async fn list_request_items(
        &self,
        filter: RequestItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<request_item::Model>, u64), ServiceError> {
        let mut query = request_item::Entity::find();

        if let Some(item_type) = filter.item_type {
            query = query.filter(request_item::Column::ItemType.eq(item_type.to_string()));
        }
        if let Some(brand) = filter.brand {
            query = query.filter(request_item::Column::Brand.eq(brand));
        }
        if let Some(request_id) = filter.request_id {
            query = query.filter(request_item::Column::RequestId.eq(request_id));
        }
        if let Some(org) = filter.organisation_id {
            let org_contacts: Vec<i32> = contact::Entity::find()
                .filter(contact::Column::OrganisationId.eq(org))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            let org_requests: Vec<i32> = request::Entity::find()
                .filter(request::Column::ContactId.is_in(org_contacts))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect();
            query = query.filter(request_item::Column::RequestId.is_in(org_requests));
        }
        if let Some(term) = filter.search.filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            query = query.filter(
                Condition::any()
                    .add(request_item::Column::Brand.like(pattern.clone()))
                    .add(request_item::Column::Model.like(pattern.clone()))
                    .add(request_item::Column::Notes.like(pattern)),
            );
        }

        let paginator = query
            .order_by_asc(request_item::Column::Brand)
            .order_by_asc(request_item::Column::Model)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn get_request_item(
        &self,
        item_id: i32,
    ) -> Result<request_item::Model, ServiceError> {
        request_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Requested item {item_id} not found")))
    }

    /// Bulk action: set the type tag on a selection of items.
    #[instrument(skip(self))]
    pub async fn set_item_type(
        &self,
        item_ids: &[i32],
        item_type: ItemType,
    ) -> Result<u64, ServiceError> {
        let result = request_item::Entity::update_many()
            .col_expr(
                request_item::Column::ItemType,
                Expr::value(item_type.to_string()),
            )
            .col_expr(request_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(request_item::Column::Id.is_in(item_ids.to_vec()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Bulk action: move items to another request, dropping alternative
    /// links that would otherwise dangle across requests.
    #[instrument(skip(self))]
    pub async fn move_items_to_request(
        &self,
        item_ids: &[i32],
        target_request_id: i32,
    ) -> Result<u64, ServiceError> {
        request::Entity::find_by_id(target_request_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Request {target_request_id} not found"))
            })?;

        let result = request_item::Entity::update_many()
            .col_expr(
                request_item::Column::RequestId,
                Expr::value(target_request_id),
            )
            .col_expr(
                request_item::Column::AlternativeFor,
                Expr::value(Option::<i32>::None),
            )
            .col_expr(request_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(request_item::Column::Id.is_in(item_ids.to_vec()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i32, brand: &str, alternative_for: Option<i32>) -> request_item::Model {
        request_item::Model {
            id,
            request_id: 1,
            item_type: "hardware".into(),
            brand: brand.into(),
            model: "X".into(),
            amount: 1,
            up_to: false,
            notes: None,
            alternative_for,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_alternative_chains_behind_top_level_items() {
        let items = vec![
            item(1, "Cisco", None),
            item(2, "Juniper", Some(1)),
            item(3, "Mikrotik", Some(2)),
            item(4, "APC", None),
        ];
        let lines = render_item_lines(&items);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1x Cisco X or 1x Juniper X or 1x Mikrotik X");
        assert_eq!(lines[1], "1x APC X");
    }

    #[test]
    fn rendering_terminates_on_cyclic_data() {
        // A pre-existing cycle (2 -> 1 -> 2 is unreachable from a root, and
        // 3 alternates with itself through 4) must not hang the walk.
        let items = vec![
            item(1, "A", None),
            item(2, "B", Some(1)),
            item(3, "C", Some(4)),
            item(4, "D", Some(3)),
        ];
        let lines = render_item_lines(&items);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "1x A X or 1x B X");
    }

    #[test]
    fn alternative_chain_rejects_self_reference_and_cycles() {
        let mut links: HashMap<i32, Option<i32>> = HashMap::new();
        links.insert(1, None);
        links.insert(2, Some(1));

        assert!(RequestService::check_alternative_chain(Some(1), 1, &links).is_err());
        // 1 -> 2 while 2 -> 1 already holds closes a cycle.
        assert!(RequestService::check_alternative_chain(Some(1), 2, &links).is_err());
        // Linking a fresh item onto 2 is fine.
        links.insert(3, None);
        assert!(RequestService::check_alternative_chain(Some(3), 2, &links).is_ok());
        // Pointing at an item outside the request is rejected.
        assert!(RequestService::check_alternative_chain(Some(3), 99, &links).is_err());
    }
}
