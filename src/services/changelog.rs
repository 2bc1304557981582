//! Append-only audit log for Offer/Request aggregates.
//!
//! Snapshots are opaque rendered text; a row is written only when the
//! before/after texts differ. Writes share the caller's transaction so a
//! failed log write fails the domain write with it.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{change, ChangeAction, ChangeType};
use crate::errors::ServiceError;

/// Record a create/update of an aggregate. Returns the written row, or
/// `None` when the snapshots are textually identical (a no-op save).
pub async fn record_saved<C: ConnectionTrait>(
    db: &C,
    who: i32,
    change_type: ChangeType,
    created: bool,
    what: &str,
    before: &str,
    after: &str,
) -> Result<Option<change::Model>, ServiceError> {
    if before == after {
        return Ok(None);
    }

    let action = if created {
        ChangeAction::Add
    } else {
        ChangeAction::Change
    };

    let row = change::ActiveModel {
        who: Set(who),
        action: Set(action.to_string()),
        change_type: Set(change_type.to_string()),
        what: Set(what.to_string()),
        before: Set(before.to_string()),
        after: Set(after.to_string()),
        when: Set(Utc::now()),
        ..Default::default()
    };

    Ok(Some(change::Entity::insert(row).exec_with_returning(db).await?))
}

/// Record a delete. Always writes; `after` is the empty string.
pub async fn record_deleted<C: ConnectionTrait>(
    db: &C,
    who: i32,
    change_type: ChangeType,
    what: &str,
    before: &str,
) -> Result<change::Model, ServiceError> {
    let row = change::ActiveModel {
        who: Set(who),
        action: Set(ChangeAction::Delete.to_string()),
        change_type: Set(change_type.to_string()),
        what: Set(what.to_string()),
        before: Set(before.to_string()),
        after: Set(String::new()),
        when: Set(Utc::now()),
        ..Default::default()
    };

    Ok(change::Entity::insert(row).exec_with_returning(db).await?)
}

/// Read-side filters for the change list.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    pub action: Option<ChangeAction>,
    pub change_type: Option<ChangeType>,
    pub who: Option<i32>,
}

#[derive(Clone)]
pub struct ChangeLogService {
    db: Arc<DbPool>,
}

impl ChangeLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Newest-first page of the audit log.
    #[instrument(skip(self))]
    pub async fn list_changes(
        &self,
        filter: ChangeFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<change::Model>, u64), ServiceError> {
        let mut query = change::Entity::find();

        if let Some(action) = filter.action {
            query = query.filter(change::Column::Action.eq(action.to_string()));
        }
        if let Some(change_type) = filter.change_type {
            query = query.filter(change::Column::ChangeType.eq(change_type.to_string()));
        }
        if let Some(who) = filter.who {
            query = query.filter(change::Column::Who.eq(who));
        }

        let paginator = query
            .order_by_desc(change::Column::When)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }
}
