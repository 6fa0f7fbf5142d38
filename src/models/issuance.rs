//! Issuance, component detail and acknowledgement models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    enums::{AcknowledgementStatus, ComponentType, IssuanceType, OperationType},
    part::{InstallPart, RemovePart},
    software::{InstallSoftware, UninstallSoftware},
};
use crate::error::{AppError, AppResult};

/// Issuance header
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Issuance {
    pub id: i32,
    /// ISS-<year>-<sequence>
    pub issuance_number: String,
    /// Type (0=whole unit, 1=component maintenance)
    pub issuance_type: i16,
    pub hardware_id: i32,
    pub issued_to: i32,
    pub created_by: i32,
    pub remarks: Option<String>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl Issuance {
    pub fn issuance_type(&self) -> IssuanceType {
        IssuanceType::from(self.issuance_type)
    }
}

/// One component operation recorded on a maintenance issuance
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ComponentDetail {
    pub id: i32,
    pub issuance_id: i32,
    /// add / replace / remove
    pub operation_type: String,
    /// part / software
    pub component_type: String,
    #[schema(value_type = Option<Object>)]
    pub old_component: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub new_component: Option<serde_json::Value>,
    pub reason: Option<String>,
    pub remarks: Option<String>,
    pub crea_date: DateTime<Utc>,
}

/// Employee receipt for an issuance
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Acknowledgement {
    pub id: i32,
    pub issuance_id: i32,
    /// Employee expected to acknowledge
    pub acknowledged_by: i32,
    /// Status (0=pending, 1=acknowledged)
    pub status: i16,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub crea_date: DateTime<Utc>,
}

impl Acknowledgement {
    pub fn status(&self) -> AcknowledgementStatus {
        AcknowledgementStatus::from(self.status)
    }
}

/// Issuance with its details and acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuanceDetails {
    #[serde(flatten)]
    pub issuance: Issuance,
    pub components: Vec<ComponentDetail>,
    pub acknowledgement: Option<Acknowledgement>,
}

/// One requested component operation, as received from the request layer
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OperationRequest {
    #[validate(range(min = 1, message = "hardware_id must be positive"))]
    pub hardware_id: i32,
    /// add / replace / remove
    pub operation: String,
    /// part / software
    pub component_type: String,
    /// Installed row (hardware part or hardware software) removed or replaced
    pub component_id: Option<i32>,
    /// working / faulty / defective / unknown
    pub removal_condition: Option<String>,
    /// New part for add / replace
    #[validate(nested)]
    pub part: Option<InstallPart>,
    /// New software for add / replace
    #[validate(nested)]
    pub software: Option<InstallSoftware>,
    /// Employee receiving the maintained unit
    pub issued_to: Option<i32>,
    pub reason: Option<String>,
    pub remarks: Option<String>,
}

/// Component to put on a unit
#[derive(Debug, Clone)]
pub enum NewComponent {
    Part(InstallPart),
    Software(InstallSoftware),
}

/// Installed component to take off a unit
#[derive(Debug, Clone)]
pub enum ExistingComponent {
    Part(RemovePart),
    Software(UninstallSoftware),
}

/// Validated component operation
#[derive(Debug, Clone)]
pub enum ComponentChange {
    Add(NewComponent),
    Remove(ExistingComponent),
    Replace {
        old: ExistingComponent,
        new: NewComponent,
    },
}

impl ComponentChange {
    pub fn operation_type(&self) -> OperationType {
        match self {
            ComponentChange::Add(_) => OperationType::Add,
            ComponentChange::Remove(_) => OperationType::Remove,
            ComponentChange::Replace { .. } => OperationType::Replace,
        }
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentChange::Add(NewComponent::Part(_))
            | ComponentChange::Remove(ExistingComponent::Part(_))
            | ComponentChange::Replace { old: ExistingComponent::Part(_), .. } => {
                ComponentType::Part
            }
            _ => ComponentType::Software,
        }
    }
}

impl TryFrom<&OperationRequest> for ComponentChange {
    type Error = AppError;

    fn try_from(req: &OperationRequest) -> AppResult<Self> {
        let operation: OperationType = req.operation.parse()?;
        let component_type: ComponentType = req.component_type.parse()?;

        let new_component = || -> AppResult<NewComponent> {
            match component_type {
                ComponentType::Part => req
                    .part
                    .clone()
                    .map(NewComponent::Part)
                    .ok_or_else(|| missing(operation, "part details")),
                ComponentType::Software => req
                    .software
                    .clone()
                    .map(NewComponent::Software)
                    .ok_or_else(|| missing(operation, "software details")),
            }
        };

        let existing_component = || -> AppResult<ExistingComponent> {
            let id = req
                .component_id
                .ok_or_else(|| missing(operation, "component_id"))?;
            Ok(match component_type {
                ComponentType::Part => ExistingComponent::Part(RemovePart {
                    hardware_part_id: id,
                    removal_condition: req.removal_condition.clone(),
                    reason: req.reason.clone(),
                    remarks: req.remarks.clone(),
                }),
                ComponentType::Software => ExistingComponent::Software(UninstallSoftware {
                    hardware_software_id: id,
                    reason: req.reason.clone(),
                    remarks: req.remarks.clone(),
                }),
            })
        };

        Ok(match operation {
            OperationType::Add => ComponentChange::Add(new_component()?),
            OperationType::Remove => ComponentChange::Remove(existing_component()?),
            OperationType::Replace => ComponentChange::Replace {
                old: existing_component()?,
                new: new_component()?,
            },
        })
    }
}

fn missing(operation: OperationType, what: &str) -> AppError {
    AppError::InvalidRequest(format!("{} operation requires {}", operation.as_str(), what))
}

/// Validate a maintenance batch before anything is touched.
///
/// Returns the single hardware id shared by all operations and the parsed changes.
pub fn validate_batch(operations: &[OperationRequest]) -> AppResult<(i32, Vec<ComponentChange>)> {
    let first = operations
        .first()
        .ok_or_else(|| AppError::InvalidRequest("At least one operation is required".to_string()))?;

    if let Some(other) = operations.iter().find(|op| op.hardware_id != first.hardware_id) {
        return Err(AppError::InvalidRequest(format!(
            "All operations must target the same hardware (got {} and {})",
            first.hardware_id, other.hardware_id
        )));
    }

    let changes = operations
        .iter()
        .map(ComponentChange::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok((first.hardware_id, changes))
}

/// Employee a maintenance issuance is issued to: the first explicit value in
/// the batch, else the unit's current holder, else the acting employee.
pub fn resolve_issued_to(
    operations: &[OperationRequest],
    current_holder: Option<i32>,
    actor_id: i32,
) -> i32 {
    operations
        .iter()
        .find_map(|op| op.issued_to)
        .or(current_holder)
        .unwrap_or(actor_id)
}

/// Issue whole hardware units to an employee
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct WholeUnitIssuanceRequest {
    #[validate(length(min = 1, message = "At least one hostname is required"))]
    pub hostnames: Vec<String>,
    #[validate(range(min = 1, message = "issued_to must be positive"))]
    pub issued_to: i32,
    pub location: Option<String>,
    pub remarks: Option<String>,
}

/// Issuance created by a successful request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuanceSummary {
    pub id: i32,
    pub issuance_number: String,
    pub hardware_id: i32,
}

/// Uniform result envelope of the issuance entry points
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuanceResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<IssuanceSummary>>,
}

impl IssuanceResult {
    pub fn ok(message: impl Into<String>, data: Vec<IssuanceSummary>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl From<AppResult<Vec<IssuanceSummary>>> for IssuanceResult {
    fn from(result: AppResult<Vec<IssuanceSummary>>) -> Self {
        match result {
            Ok(issued) => {
                let numbers: Vec<&str> = issued.iter().map(|i| i.issuance_number.as_str()).collect();
                IssuanceResult::ok(format!("Issuance {} created", numbers.join(", ")), issued)
            }
            Err(e) => IssuanceResult::failure(e.to_string()),
        }
    }
}

/// Outcome of an acknowledgement attempt
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AcknowledgementOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<Acknowledgement>,
}

impl AcknowledgementOutcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            acknowledgement: None,
        }
    }
}
