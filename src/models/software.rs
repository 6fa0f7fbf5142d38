//! Software catalog, license and installed-software models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Software title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SoftwareInventory {
    pub id: i32,
    pub software_name: String,
    pub software_type: String,
    pub version: String,
    pub publisher: Option<String>,
    /// When set, every installation consumes one license activation
    pub requires_key_tracking: bool,
    pub crea_date: DateTime<Utc>,
}

/// License of a software title with an activation ceiling
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SoftwareLicense {
    pub id: i32,
    pub software_inventory_id: i32,
    pub license_key: Option<String>,
    pub account_user: Option<String>,
    #[serde(skip_serializing)]
    pub account_password: Option<String>,
    pub max_activations: i32,
    pub current_activations: i32,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl SoftwareLicense {
    pub fn remaining_activations(&self) -> i32 {
        (self.max_activations - self.current_activations).max(0)
    }

    /// Key or account the license is known by
    pub fn label(&self) -> String {
        match (&self.license_key, &self.account_user) {
            (Some(key), _) => key.clone(),
            (None, Some(user)) => user.clone(),
            (None, None) => format!("license #{}", self.id),
        }
    }
}

/// Software installed on a hardware unit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HardwareSoftware {
    pub id: i32,
    pub hardware_id: i32,
    pub software_inventory_id: i32,
    pub software_license_id: Option<i32>,
    /// Status (0=active, 1=uninstalled)
    pub status: i16,
    pub installation_date: DateTime<Utc>,
    pub uninstall_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

/// Installed software joined with its title and license for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InstalledSoftware {
    pub id: i32,
    pub hardware_id: i32,
    pub software_inventory_id: i32,
    pub software_license_id: Option<i32>,
    pub status: i16,
    pub installation_date: DateTime<Utc>,
    pub remarks: Option<String>,
    pub software_name: String,
    pub software_type: String,
    pub version: String,
    pub license_key: Option<String>,
    pub account_user: Option<String>,
}

/// Catalog key of a software title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct SoftwareSpec {
    #[validate(length(min = 1, message = "Software name is required"))]
    pub software_name: String,
    #[validate(length(min = 1, message = "Software type is required"))]
    pub software_type: String,
    #[serde(default)]
    pub version: String,
}

impl std::fmt::Display for SoftwareSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.software_name)
        } else {
            write!(f, "{} {}", self.software_name, self.version)
        }
    }
}

/// How a caller designates the license to activate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseIdentifier {
    Key(String),
    Account(String),
}

impl LicenseIdentifier {
    /// License key wins over account user; blank values count as missing.
    pub fn from_parts(
        license_key: Option<&str>,
        account_user: Option<&str>,
        software: &str,
    ) -> AppResult<Self> {
        let non_blank = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(String::from);
        if let Some(key) = non_blank(license_key) {
            return Ok(LicenseIdentifier::Key(key));
        }
        if let Some(user) = non_blank(account_user) {
            return Ok(LicenseIdentifier::Account(user));
        }
        Err(AppError::LicenseIdentifierMissing(software.to_string()))
    }
}

impl std::fmt::Display for LicenseIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseIdentifier::Key(key) => write!(f, "key {}", key),
            LicenseIdentifier::Account(user) => write!(f, "account {}", user),
        }
    }
}

/// Install software on a hardware unit
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InstallSoftware {
    #[serde(flatten)]
    #[validate(nested)]
    pub spec: SoftwareSpec,
    pub license_key: Option<String>,
    pub account_user: Option<String>,
    pub remarks: Option<String>,
}

/// Uninstall software and release its license activation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UninstallSoftware {
    pub hardware_software_id: i32,
    pub reason: Option<String>,
    pub remarks: Option<String>,
}

/// License chosen by the allocator for an install
#[derive(Debug, Clone)]
pub struct AllocatedLicense {
    pub software: SoftwareInventory,
    pub license: SoftwareLicense,
}
