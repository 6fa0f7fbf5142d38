//! Hardware unit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{part::HardwarePart, software::InstalledSoftware};

/// Physical unit (PC) owning installed parts and software
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Hardware {
    pub id: i32,
    pub hostname: String,
    pub category: Option<String>,
    pub location: Option<String>,
    /// Employee currently holding the unit
    pub issued_to: Option<i32>,
    pub date_issued: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// Hardware reloaded with its installed components
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HardwareDetails {
    #[serde(flatten)]
    pub hardware: Hardware,
    pub parts: Vec<HardwarePart>,
    pub software: Vec<InstalledSoftware>,
}

/// Assignment fields changed when a whole unit is issued
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentUpdate {
    pub issued_to: i32,
    pub location: Option<String>,
    pub date_issued: DateTime<Utc>,
}
