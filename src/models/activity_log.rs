//! Audit trail model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Entity an activity log entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LoggableRef {
    Hardware(i32),
    Printer(i32),
    Cctv(i32),
    PartInventory(i32),
    SoftwareLicense(i32),
    Issuance(i32),
}

impl LoggableRef {
    /// Value stored in `activity_logs.loggable_type`
    pub fn type_name(&self) -> &'static str {
        match self {
            LoggableRef::Hardware(_) => "hardware",
            LoggableRef::Printer(_) => "printer",
            LoggableRef::Cctv(_) => "cctv",
            LoggableRef::PartInventory(_) => "part_inventory",
            LoggableRef::SoftwareLicense(_) => "software_license",
            LoggableRef::Issuance(_) => "issuance",
        }
    }

    pub fn id(&self) -> i32 {
        match *self {
            LoggableRef::Hardware(id)
            | LoggableRef::Printer(id)
            | LoggableRef::Cctv(id)
            | LoggableRef::PartInventory(id)
            | LoggableRef::SoftwareLicense(id)
            | LoggableRef::Issuance(id) => id,
        }
    }

    pub fn from_parts(type_name: &str, id: i32) -> Option<Self> {
        match type_name {
            "hardware" => Some(LoggableRef::Hardware(id)),
            "printer" => Some(LoggableRef::Printer(id)),
            "cctv" => Some(LoggableRef::Cctv(id)),
            "part_inventory" => Some(LoggableRef::PartInventory(id)),
            "software_license" => Some(LoggableRef::SoftwareLicense(id)),
            "issuance" => Some(LoggableRef::Issuance(id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoggableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.type_name(), self.id())
    }
}

/// Kind of mutation recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    PartAdded,
    PartRemoved,
    PartUpdated,
    SoftwareInstalled,
    SoftwareUninstalled,
    InventoryIncremented,
    InventoryDecremented,
    LicenseActivated,
    LicenseReleased,
    HardwareAssigned,
    IssuanceCreated,
    IssuanceAcknowledged,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::PartAdded => "part_added",
            ActionType::PartRemoved => "part_removed",
            ActionType::PartUpdated => "part_updated",
            ActionType::SoftwareInstalled => "software_installed",
            ActionType::SoftwareUninstalled => "software_uninstalled",
            ActionType::InventoryIncremented => "inventory_incremented",
            ActionType::InventoryDecremented => "inventory_decremented",
            ActionType::LicenseActivated => "license_activated",
            ActionType::LicenseReleased => "license_released",
            ActionType::HardwareAssigned => "hardware_assigned",
            ActionType::IssuanceCreated => "issuance_created",
            ActionType::IssuanceAcknowledged => "issuance_acknowledged",
        }
    }
}

/// Activity log row (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityLog {
    pub id: i64,
    pub loggable_type: String,
    pub loggable_id: i32,
    pub action_type: String,
    /// Employee who performed the action
    pub action_by: i32,
    pub action_at: DateTime<Utc>,
    #[schema(value_type = Option<Object>)]
    pub old_values: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub new_values: Option<serde_json::Value>,
    pub remarks: Option<String>,
}

impl ActivityLog {
    pub fn subject(&self) -> Option<LoggableRef> {
        LoggableRef::from_parts(&self.loggable_type, self.loggable_id)
    }
}

/// Entry to append to the activity log
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub subject: LoggableRef,
    pub action: ActionType,
    pub action_by: i32,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub remarks: Option<String>,
}

impl NewActivityLog {
    pub fn new(subject: LoggableRef, action: ActionType, action_by: i32) -> Self {
        Self {
            subject,
            action,
            action_by,
            old_values: None,
            new_values: None,
            remarks: None,
        }
    }

    pub fn old_values(mut self, values: serde_json::Value) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn new_values(mut self, values: serde_json::Value) -> Self {
        self.new_values = Some(values);
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// Activity log entry decorated for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityLogEntry {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub actor_name: String,
}
