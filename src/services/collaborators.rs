//! Interfaces to collaborators living outside the maintenance core

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::{error::AppResult, models::hardware::AssignmentUpdate};

/// Updates who holds a hardware unit and where it is
#[async_trait]
pub trait HardwareAssignments: Send + Sync {
    /// Runs on the caller's transaction
    async fn update_assignment(
        &self,
        conn: &mut PgConnection,
        hardware_id: i32,
        update: &AssignmentUpdate,
        actor_id: i32,
    ) -> AppResult<()>;
}

/// Resolves employee ids to display names for audit history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn display_name(&self, employee_id: i32) -> AppResult<Option<String>>;
}
