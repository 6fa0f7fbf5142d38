//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{hardware, health, inventory, issuances};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssetDesk API",
        version = "1.0.0",
        description = "IT asset inventory, component maintenance and issuance tracking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Hardware
        hardware::get_hardware,
        hardware::add_component,
        hardware::remove_component,
        hardware::replace_component,
        hardware::update_part,
        // Issuances
        issuances::create_component_maintenance,
        issuances::create_whole_unit,
        issuances::get_issuance,
        issuances::acknowledge,
        issuances::pending_acknowledgements,
        // Inventory & audit
        inventory::get_part_inventory,
        inventory::get_activity_logs,
    ),
    components(
        schemas(
            // Hardware
            crate::models::hardware::Hardware,
            crate::models::hardware::HardwareDetails,
            crate::models::part::HardwarePart,
            crate::models::part::PartSpec,
            crate::models::part::InstallPart,
            crate::models::part::UpdatePartDetails,
            crate::models::software::InstalledSoftware,
            crate::models::software::SoftwareSpec,
            crate::models::software::InstallSoftware,
            hardware::ComponentRequest,
            // Issuances
            crate::models::issuance::Issuance,
            crate::models::issuance::IssuanceDetails,
            crate::models::issuance::ComponentDetail,
            crate::models::issuance::Acknowledgement,
            crate::models::issuance::OperationRequest,
            crate::models::issuance::WholeUnitIssuanceRequest,
            crate::models::issuance::IssuanceSummary,
            crate::models::issuance::IssuanceResult,
            crate::models::issuance::AcknowledgementOutcome,
            issuances::ComponentMaintenanceRequest,
            // Inventory & audit
            crate::models::part::PartInventory,
            crate::models::activity_log::ActivityLog,
            crate::models::activity_log::ActivityLogEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "hardware", description = "Component maintenance on hardware units"),
        (name = "issuances", description = "Issuances and acknowledgements"),
        (name = "inventory", description = "Part stock and audit history")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
