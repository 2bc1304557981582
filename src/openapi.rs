use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Donorlift API",
        version = "0.3.0",
        description = r#"
Administrative backend for donation logistics.

Donors submit offers, recipients submit requests, staff earmark offered
items through claims and move them between locations in shipments. The
shipment-item ledger is append-only; availability is always recomputed
from it.

All endpoints require a JWT bearer token obtained from `/auth/login`.
Logistics surfaces (locations, shipments, the assignment workflow, the
audit log, CSV import/export) additionally require the superuser flag.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::handlers::offers::list_offers,
        crate::handlers::offers::get_offer,
        crate::handlers::offers::create_offer,
        crate::handlers::offers::update_offer,
        crate::handlers::offers::delete_offer,
        crate::handlers::offer_items::list_offer_items,
        crate::handlers::offer_items::get_offer_item,
        crate::handlers::offer_items::set_item_type,
        crate::handlers::offer_items::move_to_offer,
        crate::handlers::requests::list_requests,
        crate::handlers::requests::get_request,
        crate::handlers::requests::create_request,
        crate::handlers::requests::update_request,
        crate::handlers::requests::delete_request,
        crate::handlers::request_items::list_request_items,
        crate::handlers::request_items::get_request_item,
        crate::handlers::request_items::set_item_type,
        crate::handlers::request_items::move_to_request,
        crate::handlers::items::list_pool,
        crate::handlers::items::list_intake_pool,
        crate::handlers::items::validate_selection,
        crate::handlers::items::assign_to_shipment,
        crate::handlers::items::intake,
        crate::handlers::items::offer_item_availability,
        crate::handlers::items::item_history,
        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::get_shipment,
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::update_shipment,
        crate::handlers::shipments::mark_delivered,
        crate::handlers::shipments::list_shipment_items,
        crate::handlers::locations::list_locations,
        crate::handlers::locations::get_location,
        crate::handlers::locations::create_location,
        crate::handlers::locations::update_location,
        crate::handlers::equipment::list_equipment,
        crate::handlers::equipment::import_equipment,
        crate::handlers::equipment::export_equipment,
        crate::handlers::claims::list_claims,
        crate::handlers::claims::create_claim,
        crate::handlers::claims::export_claims,
        crate::handlers::changes::list_changes,
    ),
    tags(
        (name = "offers", description = "Donor offers and their items"),
        (name = "offer-items", description = "Offered-item collection"),
        (name = "requests", description = "Recipient requests and their items"),
        (name = "request-items", description = "Requested-item collection"),
        (name = "items", description = "Assignable pool and the assignment workflow"),
        (name = "shipments", description = "Transport legs and the ledger"),
        (name = "locations", description = "Location directory"),
        (name = "equipment", description = "Equipment catalog and CSV import/export"),
        (name = "claims", description = "Earmarks and the claims report"),
        (name = "changes", description = "Read-only audit log"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
