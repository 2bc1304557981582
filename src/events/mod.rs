use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OfferSaved {
        offer_id: i32,
        created: bool,
    },
    OfferDeleted {
        offer_id: i32,
    },
    RequestSaved {
        request_id: i32,
        created: bool,
    },
    RequestDeleted {
        request_id: i32,
    },
    ItemsAssigned {
        shipment_id: i32,
        item_count: usize,
    },
    ItemIntake {
        offered_item_id: i32,
        amount: i32,
    },
    ShipmentDelivered {
        shipment_id: i32,
    },
    EquipmentImported {
        created: usize,
        updated: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; a full or closed channel is logged, not fatal.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "event channel closed, dropping event");
        }
    }
}

/// Background task draining the event channel.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ItemsAssigned {
                shipment_id,
                item_count,
            } => info!(shipment_id, item_count, "items assigned to shipment"),
            Event::ShipmentDelivered { shipment_id } => {
                info!(shipment_id, "shipment delivered")
            }
            other => info!(event = ?other, "domain event"),
        }
    }
    info!("event channel drained, processor exiting");
}
