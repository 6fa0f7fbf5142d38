//! Hardware component endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        enums::OperationType,
        hardware::HardwareDetails,
        issuance::{ComponentChange, OperationRequest},
        part::{HardwarePart, InstallPart, UpdatePartDetails},
        software::InstallSoftware,
    },
    AppState,
};

use super::Actor;

/// Component to add, remove or replace on one unit
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ComponentRequest {
    /// part / software
    pub component_type: String,
    /// Installed row taken off (remove / replace)
    pub component_id: Option<i32>,
    /// working / faulty / defective / unknown
    pub removal_condition: Option<String>,
    #[validate(nested)]
    pub part: Option<InstallPart>,
    #[validate(nested)]
    pub software: Option<InstallSoftware>,
    pub reason: Option<String>,
    pub remarks: Option<String>,
}

impl ComponentRequest {
    fn into_operation(self, hardware_id: i32, operation: OperationType) -> OperationRequest {
        OperationRequest {
            hardware_id,
            operation: operation.as_str().to_string(),
            component_type: self.component_type,
            component_id: self.component_id,
            removal_condition: self.removal_condition,
            part: self.part,
            software: self.software,
            issued_to: None,
            reason: self.reason,
            remarks: self.remarks,
        }
    }
}

/// Get hardware with its installed components
#[utoipa::path(
    get,
    path = "/hardware/{id}",
    tag = "hardware",
    params(("id" = i32, Path, description = "Hardware ID")),
    responses(
        (status = 200, description = "Hardware details", body = HardwareDetails),
        (status = 404, description = "Hardware not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_hardware(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<HardwareDetails>> {
    let details = state.services.components.hardware_details(id).await?;
    Ok(Json(details))
}

/// Install a part or software on a unit
#[utoipa::path(
    post,
    path = "/hardware/{id}/components/add",
    tag = "hardware",
    params(
        ("id" = i32, Path, description = "Hardware ID"),
        ("X-Employee-Id" = i32, Header, description = "Acting employee")
    ),
    request_body = ComponentRequest,
    responses(
        (status = 200, description = "Component installed", body = HardwareDetails),
        (status = 409, description = "No stock or license left", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_component(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    Json(data): Json<ComponentRequest>,
) -> AppResult<Json<HardwareDetails>> {
    run_change(&state, id, data, OperationType::Add, actor_id).await
}

/// Remove an installed part or software from a unit
#[utoipa::path(
    post,
    path = "/hardware/{id}/components/remove",
    tag = "hardware",
    params(
        ("id" = i32, Path, description = "Hardware ID"),
        ("X-Employee-Id" = i32, Header, description = "Acting employee")
    ),
    request_body = ComponentRequest,
    responses(
        (status = 200, description = "Component removed", body = HardwareDetails),
        (status = 404, description = "Component not installed on this unit", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_component(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    Json(data): Json<ComponentRequest>,
) -> AppResult<Json<HardwareDetails>> {
    run_change(&state, id, data, OperationType::Remove, actor_id).await
}

/// Replace an installed component in one step
#[utoipa::path(
    post,
    path = "/hardware/{id}/components/replace",
    tag = "hardware",
    params(
        ("id" = i32, Path, description = "Hardware ID"),
        ("X-Employee-Id" = i32, Header, description = "Acting employee")
    ),
    request_body = ComponentRequest,
    responses(
        (status = 200, description = "Component replaced", body = HardwareDetails),
        (status = 409, description = "No stock or license left", body = crate::error::ErrorResponse)
    )
)]
pub async fn replace_component(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<i32>,
    Json(data): Json<ComponentRequest>,
) -> AppResult<Json<HardwareDetails>> {
    run_change(&state, id, data, OperationType::Replace, actor_id).await
}

/// Edit serial number or remarks of an installed part
#[utoipa::path(
    patch,
    path = "/hardware/{id}/parts/{part_id}",
    tag = "hardware",
    params(
        ("id" = i32, Path, description = "Hardware ID"),
        ("part_id" = i32, Path, description = "Installed part ID"),
        ("X-Employee-Id" = i32, Header, description = "Acting employee")
    ),
    request_body = UpdatePartDetails,
    responses(
        (status = 200, description = "Part updated", body = HardwarePart)
    )
)]
pub async fn update_part(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path((id, part_id)): Path<(i32, i32)>,
    Json(data): Json<UpdatePartDetails>,
) -> AppResult<Json<HardwarePart>> {
    let part = state
        .services
        .components
        .update_part_details(id, part_id, &data, actor_id)
        .await?;
    Ok(Json(part))
}

async fn run_change(
    state: &AppState,
    hardware_id: i32,
    data: ComponentRequest,
    operation: OperationType,
    actor_id: i32,
) -> AppResult<Json<HardwareDetails>> {
    data.validate()?;
    let request = data.into_operation(hardware_id, operation);
    let components = &state.services.components;

    let details = match ComponentChange::try_from(&request)? {
        ComponentChange::Add(new) => components.add_component(hardware_id, new, actor_id).await?,
        ComponentChange::Remove(old) => components.remove_component(hardware_id, old, actor_id).await?,
        ComponentChange::Replace { old, new } => {
            components.replace_component(hardware_id, old, new, actor_id).await?
        }
    };
    Ok(Json(details))
}
