//! Issuance and acknowledgement endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::issuance::{
        AcknowledgementOutcome, Issuance, IssuanceDetails, IssuanceResult, OperationRequest,
        WholeUnitIssuanceRequest,
    },
    AppState,
};

use super::Actor;

/// Batch of component operations on one unit
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ComponentMaintenanceRequest {
    #[validate(length(min = 1, message = "At least one operation is required"))]
    #[validate(nested)]
    pub operations: Vec<OperationRequest>,
}

fn envelope_status(result: &IssuanceResult) -> StatusCode {
    if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

/// Record a component maintenance issuance
#[utoipa::path(
    post,
    path = "/issuances/component-maintenance",
    tag = "issuances",
    params(("X-Employee-Id" = i32, Header, description = "Acting employee")),
    request_body = ComponentMaintenanceRequest,
    responses(
        (status = 201, description = "Issuance created", body = IssuanceResult),
        (status = 422, description = "Batch rejected, nothing was changed", body = IssuanceResult)
    )
)]
pub async fn create_component_maintenance(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Json(data): Json<ComponentMaintenanceRequest>,
) -> AppResult<(StatusCode, Json<IssuanceResult>)> {
    data.validate()?;
    let result = state
        .services
        .issuances
        .process_component_maintenance(&data.operations, actor_id)
        .await;
    Ok((envelope_status(&result), Json(result)))
}

/// Issue whole units to an employee
#[utoipa::path(
    post,
    path = "/issuances/whole-unit",
    tag = "issuances",
    params(("X-Employee-Id" = i32, Header, description = "Acting employee")),
    request_body = WholeUnitIssuanceRequest,
    responses(
        (status = 201, description = "Issuances created", body = IssuanceResult),
        (status = 422, description = "Request rejected, nothing was changed", body = IssuanceResult)
    )
)]
pub async fn create_whole_unit(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Json(data): Json<WholeUnitIssuanceRequest>,
) -> AppResult<(StatusCode, Json<IssuanceResult>)> {
    data.validate()?;
    let result = state
        .services
        .issuances
        .create_whole_unit_issuance(&data, actor_id)
        .await;
    Ok((envelope_status(&result), Json(result)))
}

/// Get an issuance with its component details and acknowledgement
#[utoipa::path(
    get,
    path = "/issuances/{id}",
    tag = "issuances",
    params(("id" = i32, Path, description = "Issuance ID")),
    responses(
        (status = 200, description = "Issuance details", body = IssuanceDetails),
        (status = 404, description = "Issuance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_issuance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<IssuanceDetails>> {
    let details = state.services.issuances.get_issuance(id).await?;
    Ok(Json(details))
}

/// Acknowledge receipt of an issuance
#[utoipa::path(
    post,
    path = "/issuances/{id}/acknowledge",
    tag = "issuances",
    params(
        ("id" = i32, Path, description = "Issuance ID"),
        ("X-Employee-Id" = i32, Header, description = "Acknowledging employee")
    ),
    responses(
        (status = 200, description = "Issuance acknowledged", body = AcknowledgementOutcome),
        (status = 409, description = "Already acknowledged or not the receiving employee", body = AcknowledgementOutcome)
    )
)]
pub async fn acknowledge(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<AcknowledgementOutcome>)> {
    let outcome = state.services.issuances.acknowledge(id, actor_id).await?;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    Ok((status, Json(outcome)))
}

/// Issuances an employee still has to acknowledge
#[utoipa::path(
    get,
    path = "/employees/{id}/acknowledgements/pending",
    tag = "issuances",
    params(("id" = i32, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Pending issuances", body = Vec<Issuance>)
    )
)]
pub async fn pending_acknowledgements(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Issuance>>> {
    let issuances = state.services.issuances.pending_for_employee(id).await?;
    Ok(Json(issuances))
}
