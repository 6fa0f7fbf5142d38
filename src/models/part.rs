//! Part catalog, part inventory and installed-part models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{PartCondition, PartStatus};

/// Part catalog entry (reference data, never holds quantities)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Part {
    pub id: i32,
    pub part_type: String,
    pub brand: String,
    pub model: String,
    pub specifications: String,
    pub crea_date: DateTime<Utc>,
}

/// Stock of one catalog part in one condition
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PartInventory {
    pub id: i32,
    pub part_id: i32,
    /// Working / Used / Defective / Unknown
    pub condition: String,
    pub quantity: i32,
    pub location: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl PartInventory {
    /// Condition of the row; labels outside the known set read as Unknown
    pub fn condition(&self) -> PartCondition {
        self.condition.parse().unwrap_or(PartCondition::Unknown)
    }
}

/// Part installed on a hardware unit.
///
/// The descriptive fields are a snapshot of the catalog entry taken at
/// install time; later catalog edits never change them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HardwarePart {
    pub id: i32,
    pub hardware_id: i32,
    pub part_type: String,
    pub brand: String,
    pub model: String,
    pub specifications: String,
    pub serial_number: Option<String>,
    pub condition: String,
    /// Inventory row the unit was drawn from
    pub source_inventory_id: Option<i32>,
    /// Status (0=installed, 1=removed)
    pub status: i16,
    pub installed_date: DateTime<Utc>,
    pub removed_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl HardwarePart {
    pub fn status(&self) -> PartStatus {
        PartStatus::from(self.status)
    }

    pub fn spec(&self) -> PartSpec {
        PartSpec {
            part_type: self.part_type.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            specifications: self.specifications.clone(),
        }
    }
}

/// Catalog key of a part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PartSpec {
    #[validate(length(min = 1, message = "Part type is required"))]
    pub part_type: String,
    #[validate(length(min = 1, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,
    #[serde(default)]
    pub specifications: String,
}

impl From<&Part> for PartSpec {
    fn from(part: &Part) -> Self {
        Self {
            part_type: part.part_type.clone(),
            brand: part.brand.clone(),
            model: part.model.clone(),
            specifications: part.specifications.clone(),
        }
    }
}

impl std::fmt::Display for PartSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.part_type, self.brand, self.model)?;
        if !self.specifications.is_empty() {
            write!(f, " ({})", self.specifications)?;
        }
        Ok(())
    }
}

/// Install a part on a hardware unit
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InstallPart {
    #[serde(flatten)]
    #[validate(nested)]
    pub spec: PartSpec,
    /// Desired condition (defaults to Working)
    pub condition: Option<String>,
    pub serial_number: Option<String>,
    pub remarks: Option<String>,
}

/// Remove an installed part and return it to inventory
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemovePart {
    pub hardware_part_id: i32,
    /// working / faulty / defective / unknown
    pub removal_condition: Option<String>,
    pub reason: Option<String>,
    pub remarks: Option<String>,
}

/// Edit serial number or remarks of an installed part
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePartDetails {
    pub serial_number: Option<String>,
    pub remarks: Option<String>,
}

/// Inventory unit chosen by the allocator for an install
#[derive(Debug, Clone)]
pub struct AllocatedUnit {
    pub part: Part,
    pub inventory: PartInventory,
    /// Condition of the chosen inventory row
    pub condition: PartCondition,
    /// True when the requested condition had no stock
    pub fell_back: bool,
}
