pub mod changes;
pub mod claims;
pub mod equipment;
pub mod items;
pub mod locations;
pub mod offer_items;
pub mod offers;
pub mod request_items;
pub mod requests;
pub mod shipments;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub offers: Arc<crate::services::offers::OfferService>,
    pub requests: Arc<crate::services::requests::RequestService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub shipments: Arc<crate::services::shipments::ShipmentService>,
    pub locations: Arc<crate::services::locations::LocationService>,
    pub equipment: Arc<crate::services::equipment::EquipmentService>,
    pub claims: Arc<crate::services::claims::ClaimService>,
    pub changelog: Arc<crate::services::changelog::ChangeLogService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            offers: Arc::new(crate::services::offers::OfferService::new(
                db.clone(),
                event_sender.clone(),
            )),
            requests: Arc::new(crate::services::requests::RequestService::new(
                db.clone(),
                event_sender.clone(),
            )),
            inventory: Arc::new(crate::services::inventory::InventoryService::new(
                db.clone(),
                event_sender.clone(),
            )),
            shipments: Arc::new(crate::services::shipments::ShipmentService::new(
                db.clone(),
                event_sender.clone(),
            )),
            locations: Arc::new(crate::services::locations::LocationService::new(db.clone())),
            equipment: Arc::new(crate::services::equipment::EquipmentService::new(
                db.clone(),
                event_sender,
            )),
            claims: Arc::new(crate::services::claims::ClaimService::new(db.clone())),
            changelog: Arc::new(crate::services::changelog::ChangeLogService::new(db)),
        }
    }
}
