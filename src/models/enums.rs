//! Shared domain enums

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// PartCondition
// ---------------------------------------------------------------------------

/// Physical condition of a part. Inventory rows are partitioned by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PartCondition {
    Working,
    Used,
    Defective,
    Unknown,
}

impl PartCondition {
    /// Label stored in `part_inventories.condition` and `hardware_parts.condition`
    pub fn as_str(&self) -> &'static str {
        match self {
            PartCondition::Working => "Working",
            PartCondition::Used => "Used",
            PartCondition::Defective => "Defective",
            PartCondition::Unknown => "Unknown",
        }
    }

    /// Map a removal condition reported by a technician onto the inventory
    /// vocabulary. Unmapped or missing labels go back to stock as Working.
    pub fn from_removal_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("working") => PartCondition::Working,
            Some("faulty") => PartCondition::Used,
            Some("defective") => PartCondition::Defective,
            _ => PartCondition::Working,
        }
    }
}

impl FromStr for PartCondition {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Ok(PartCondition::Working),
            "used" => Ok(PartCondition::Used),
            "defective" => Ok(PartCondition::Defective),
            "unknown" => Ok(PartCondition::Unknown),
            other => Err(AppError::Validation(format!("Unknown part condition '{}'", other))),
        }
    }
}

impl std::fmt::Display for PartCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PartStatus
// ---------------------------------------------------------------------------

/// Status codes stored in `hardware_parts.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum PartStatus {
    Installed = 0,
    Removed = 1,
}

impl From<i16> for PartStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => PartStatus::Removed,
            _ => PartStatus::Installed,
        }
    }
}

impl From<PartStatus> for i16 {
    fn from(s: PartStatus) -> Self {
        s as i16
    }
}

// ---------------------------------------------------------------------------
// SoftwareStatus
// ---------------------------------------------------------------------------

/// Status codes stored in `hardware_software.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum SoftwareStatus {
    Active = 0,
    Uninstalled = 1,
}

impl From<i16> for SoftwareStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => SoftwareStatus::Uninstalled,
            _ => SoftwareStatus::Active,
        }
    }
}

impl From<SoftwareStatus> for i16 {
    fn from(s: SoftwareStatus) -> Self {
        s as i16
    }
}

// ---------------------------------------------------------------------------
// IssuanceType
// ---------------------------------------------------------------------------

/// Issuance type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum IssuanceType {
    WholeUnit = 0,
    ComponentMaintenance = 1,
}

impl From<i16> for IssuanceType {
    fn from(v: i16) -> Self {
        match v {
            1 => IssuanceType::ComponentMaintenance,
            _ => IssuanceType::WholeUnit,
        }
    }
}

impl From<IssuanceType> for i16 {
    fn from(t: IssuanceType) -> Self {
        t as i16
    }
}

impl std::fmt::Display for IssuanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IssuanceType::WholeUnit => "Whole Unit",
            IssuanceType::ComponentMaintenance => "Component Maintenance",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// AcknowledgementStatus
// ---------------------------------------------------------------------------

/// Acknowledgement status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum AcknowledgementStatus {
    Pending = 0,
    Acknowledged = 1,
}

impl From<i16> for AcknowledgementStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => AcknowledgementStatus::Acknowledged,
            _ => AcknowledgementStatus::Pending,
        }
    }
}

impl From<AcknowledgementStatus> for i16 {
    fn from(s: AcknowledgementStatus) -> Self {
        s as i16
    }
}

// ---------------------------------------------------------------------------
// OperationType / ComponentType
// ---------------------------------------------------------------------------

/// Component maintenance operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Add,
    Replace,
    Remove,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Add => "add",
            OperationType::Replace => "replace",
            OperationType::Remove => "remove",
        }
    }
}

impl FromStr for OperationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(OperationType::Add),
            "replace" => Ok(OperationType::Replace),
            "remove" => Ok(OperationType::Remove),
            other => Err(AppError::InvalidRequest(format!("Unknown operation '{}'", other))),
        }
    }
}

/// Kind of component an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Part,
    Software,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Part => "part",
            ComponentType::Software => "software",
        }
    }
}

impl FromStr for ComponentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "part" => Ok(ComponentType::Part),
            "software" => Ok(ComponentType::Software),
            other => Err(AppError::InvalidRequest(format!("Unknown component type '{}'", other))),
        }
    }
}
