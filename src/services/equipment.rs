//! Equipment catalog with CSV bulk import/export.
//!
//! The CSV column set (`brand,model,width,height,depth,weight`) and the
//! brand+model import key are an external contract for spreadsheet
//! tooling; do not reorder.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::equipment_data;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

pub const CSV_HEADERS: [&str; 6] = ["brand", "model", "width", "height", "depth", "weight"];

/// One CSV row; also the import wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvRow {
    brand: String,
    model: String,
    width: Option<Decimal>,
    height: Option<Decimal>,
    depth: Option<Decimal>,
    weight: Option<Decimal>,
}

/// Outcome of a bulk import. Malformed rows are reported individually;
/// valid rows still apply.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct EquipmentService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl EquipmentService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_equipment(
        &self,
        search: Option<String>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<equipment_data::Model>, u64), ServiceError> {
        let mut query = equipment_data::Entity::find();

        if let Some(term) = search.filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            query = query.filter(
                Condition::any()
                    .add(equipment_data::Column::Brand.like(pattern.clone()))
                    .add(equipment_data::Column::Model.like(pattern)),
            );
        }

        let paginator = query
            .order_by_asc(equipment_data::Column::Brand)
            .order_by_asc(equipment_data::Column::Model)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    /// Import catalog rows from CSV text, upserting on brand+model.
    #[instrument(skip(self, csv_text))]
    pub async fn import_csv(&self, csv_text: &str) -> Result<ImportReport, ServiceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut report = ImportReport {
            created: 0,
            updated: 0,
            errors: Vec::new(),
        };

        for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
            // Header is line 1, first data row line 2.
            let line = index + 2;
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    report.errors.push(format!("line {line}: {e}"));
                    continue;
                }
            };

            if row.brand.is_empty() || row.model.is_empty() {
                report
                    .errors
                    .push(format!("line {line}: brand and model are required"));
                continue;
            }

            let existing = equipment_data::Entity::find()
                .filter(equipment_data::Column::Brand.eq(row.brand.clone()))
                .filter(equipment_data::Column::Model.eq(row.model.clone()))
                .one(&*self.db)
                .await?;

            match existing {
                Some(current) => {
                    let mut update: equipment_data::ActiveModel = current.into();
                    update.width = Set(row.width);
                    update.height = Set(row.height);
                    update.depth = Set(row.depth);
                    update.weight = Set(row.weight);
                    equipment_data::Entity::update(update).exec(&*self.db).await?;
                    report.updated += 1;
                }
                None => {
                    let model = equipment_data::ActiveModel {
                        brand: Set(row.brand),
                        model: Set(row.model),
                        width: Set(row.width),
                        height: Set(row.height),
                        depth: Set(row.depth),
                        weight: Set(row.weight),
                        ..Default::default()
                    };
                    equipment_data::Entity::insert(model).exec(&*self.db).await?;
                    report.created += 1;
                }
            }
        }

        self.event_sender
            .send(Event::EquipmentImported {
                created: report.created,
                updated: report.updated,
            })
            .await;

        Ok(report)
    }

    /// Export the whole catalog as CSV text, ordered by brand then model.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<String, ServiceError> {
        let rows = equipment_data::Entity::find()
            .order_by_asc(equipment_data::Column::Brand)
            .order_by_asc(equipment_data::Column::Model)
            .all(&*self.db)
            .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(CSV_HEADERS)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        for row in rows {
            let record = [
                row.brand,
                row.model,
                row.width.map(|v| v.to_string()).unwrap_or_default(),
                row.height.map(|v| v.to_string()).unwrap_or_default(),
                row.depth.map(|v| v.to_string()).unwrap_or_default(),
                row.weight.map(|v| v.to_string()).unwrap_or_default(),
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
