//! Data models for AssetDesk

pub mod activity_log;
pub mod enums;
pub mod hardware;
pub mod issuance;
pub mod part;
pub mod software;

// Re-export commonly used types
pub use activity_log::{ActionType, ActivityLog, LoggableRef, NewActivityLog};
pub use enums::{ComponentType, OperationType, PartCondition};
pub use hardware::{Hardware, HardwareDetails};
pub use issuance::{ComponentChange, Issuance, IssuanceResult, OperationRequest};
pub use part::{HardwarePart, Part, PartInventory, PartSpec};
pub use software::{HardwareSoftware, SoftwareInventory, SoftwareLicense, SoftwareSpec};
