//! Stock and audit trail endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        activity_log::{ActivityLogEntry, LoggableRef},
        part::PartInventory,
    },
    AppState,
};

/// Stock of a catalog part, per condition
#[utoipa::path(
    get,
    path = "/parts/{id}/inventory",
    tag = "inventory",
    params(("id" = i32, Path, description = "Catalog part ID")),
    responses(
        (status = 200, description = "Inventory rows", body = Vec<PartInventory>),
        (status = 404, description = "Part not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_part_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<PartInventory>>> {
    let rows = state.services.ledger.inventory_for_part(id).await?;
    Ok(Json(rows))
}

/// Audit history of one entity, newest first
#[utoipa::path(
    get,
    path = "/activity-logs/{entity}/{id}",
    tag = "inventory",
    params(
        ("entity" = String, Path, description = "hardware, printer, cctv, part_inventory, software_license or issuance"),
        ("id" = i32, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Activity log entries", body = Vec<ActivityLogEntry>),
        (status = 400, description = "Unknown entity type", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_activity_logs(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, i32)>,
) -> AppResult<Json<Vec<ActivityLogEntry>>> {
    let subject = LoggableRef::from_parts(&entity, id)
        .ok_or_else(|| AppError::InvalidRequest(format!("Unknown entity type '{}'", entity)))?;
    let entries = state.services.activity_log.history(subject).await?;
    Ok(Json(entries))
}
