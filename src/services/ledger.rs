//! Inventory ledger: part stock and license activation counters
//!
//! Every counter change locks its row, is checked against the counter's
//! bounds before the write, and leaves an activity log entry with the
//! before/after value. All methods run on the caller's transaction.

use serde_json::json;
use sqlx::PgConnection;

use super::activity_log::ActivityLogService;
use crate::{
    error::{AppError, AppResult},
    models::{
        activity_log::{ActionType, LoggableRef, NewActivityLog},
        enums::PartCondition,
        hardware::Hardware,
        part::PartInventory,
        software::SoftwareLicense,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct InventoryLedger {
    repository: Repository,
    activity: ActivityLogService,
}

impl InventoryLedger {
    pub fn new(repository: Repository, activity: ActivityLogService) -> Self {
        Self {
            repository,
            activity,
        }
    }

    /// Stock of a catalog part, one row per condition
    pub async fn inventory_for_part(&self, part_id: i32) -> AppResult<Vec<PartInventory>> {
        self.repository.parts.get_by_id(part_id).await?;
        self.repository.parts.list_inventory(part_id).await
    }

    /// Return stock to an inventory row
    pub async fn increment_inventory(
        &self,
        conn: &mut PgConnection,
        inventory_id: i32,
        qty: i32,
        reason: &str,
        actor_id: i32,
        context: Option<&Hardware>,
    ) -> AppResult<PartInventory> {
        ensure_positive(qty)?;
        let before = self.lock_inventory(conn, inventory_id).await?;
        let after = self.repository.parts.add_quantity(conn, inventory_id, qty).await?;

        let entry = NewActivityLog::new(
            LoggableRef::PartInventory(inventory_id),
            ActionType::InventoryIncremented,
            actor_id,
        )
        .old_values(json!({ "quantity": before.quantity }))
        .new_values(json!({ "quantity": after.quantity }))
        .remarks(stock_remarks("Added", qty, reason, context));
        self.activity.record(conn, &entry).await?;

        tracing::debug!(
            "Inventory #{} ({}) {} -> {}",
            inventory_id, after.condition, before.quantity, after.quantity
        );
        Ok(after)
    }

    /// Take stock from an inventory row; never lets the quantity go negative
    pub async fn decrement_inventory(
        &self,
        conn: &mut PgConnection,
        inventory_id: i32,
        qty: i32,
        reason: &str,
        actor_id: i32,
        context: Option<&Hardware>,
    ) -> AppResult<PartInventory> {
        ensure_positive(qty)?;
        let before = self.lock_inventory(conn, inventory_id).await?;
        if before.quantity < qty {
            return Err(insufficient(&before, qty));
        }

        let after = self
            .repository
            .parts
            .subtract_quantity(conn, inventory_id, qty)
            .await?
            .ok_or_else(|| insufficient(&before, qty))?;

        let entry = NewActivityLog::new(
            LoggableRef::PartInventory(inventory_id),
            ActionType::InventoryDecremented,
            actor_id,
        )
        .old_values(json!({ "quantity": before.quantity }))
        .new_values(json!({ "quantity": after.quantity }))
        .remarks(stock_remarks("Took", qty, reason, context));
        self.activity.record(conn, &entry).await?;

        tracing::debug!(
            "Inventory #{} ({}) {} -> {}",
            inventory_id, after.condition, before.quantity, after.quantity
        );
        Ok(after)
    }

    /// The (part, condition) row, created empty if missing
    pub async fn find_or_create_inventory(
        &self,
        conn: &mut PgConnection,
        part_id: i32,
        condition: PartCondition,
    ) -> AppResult<PartInventory> {
        let parts = &self.repository.parts;
        if let Some(row) = parts.lock_inventory_by_condition(conn, part_id, condition).await? {
            return Ok(row);
        }
        if let Some(row) = parts.insert_inventory_if_absent(conn, part_id, condition).await? {
            tracing::info!("Created {} inventory row #{} for part #{}", condition, row.id, part_id);
            return Ok(row);
        }
        // Lost the insert race to a concurrent transaction
        parts
            .lock_inventory_by_condition(conn, part_id, condition)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Inventory for part {} ({}) vanished", part_id, condition))
            })
    }

    /// Consume license activations; rejected before the write when it would exceed the ceiling
    pub async fn increment_license_activation(
        &self,
        conn: &mut PgConnection,
        license_id: i32,
        qty: i32,
        reason: &str,
        actor_id: i32,
    ) -> AppResult<SoftwareLicense> {
        ensure_positive(qty)?;
        let before = self.lock_license(conn, license_id).await?;
        if before.current_activations + qty > before.max_activations {
            return Err(AppError::LicenseExhausted(format!(
                "{} has {}/{} activations in use",
                before.label(),
                before.current_activations,
                before.max_activations
            )));
        }

        let after = self
            .repository
            .software
            .set_activations(conn, license_id, before.current_activations + qty)
            .await?;

        let entry = NewActivityLog::new(
            LoggableRef::SoftwareLicense(license_id),
            ActionType::LicenseActivated,
            actor_id,
        )
        .old_values(json!({ "current_activations": before.current_activations }))
        .new_values(json!({ "current_activations": after.current_activations }))
        .remarks(reason);
        self.activity.record(conn, &entry).await?;

        Ok(after)
    }

    /// Release license activations. Clamps at zero instead of failing.
    pub async fn decrement_license_activation(
        &self,
        conn: &mut PgConnection,
        license_id: i32,
        qty: i32,
        reason: &str,
        actor_id: i32,
    ) -> AppResult<SoftwareLicense> {
        ensure_positive(qty)?;
        let before = self.lock_license(conn, license_id).await?;
        if before.current_activations == 0 {
            tracing::warn!(
                "License #{} has no activations left to release ({})",
                license_id, reason
            );
            return Ok(before);
        }
        if before.current_activations < qty {
            tracing::warn!(
                "Releasing {} activation(s) from license #{} which only has {}; clamping to 0",
                qty, license_id, before.current_activations
            );
        }

        let remaining = (before.current_activations - qty).max(0);
        let after = self
            .repository
            .software
            .set_activations(conn, license_id, remaining)
            .await?;

        let entry = NewActivityLog::new(
            LoggableRef::SoftwareLicense(license_id),
            ActionType::LicenseReleased,
            actor_id,
        )
        .old_values(json!({ "current_activations": before.current_activations }))
        .new_values(json!({ "current_activations": after.current_activations }))
        .remarks(reason);
        self.activity.record(conn, &entry).await?;

        Ok(after)
    }

    async fn lock_inventory(&self, conn: &mut PgConnection, id: i32) -> AppResult<PartInventory> {
        self.repository
            .parts
            .lock_inventory(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Inventory {} not found", id)))
    }

    async fn lock_license(&self, conn: &mut PgConnection, id: i32) -> AppResult<SoftwareLicense> {
        self.repository
            .software
            .lock_license(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Software license {} not found", id)))
    }
}

fn ensure_positive(qty: i32) -> AppResult<()> {
    if qty <= 0 {
        return Err(AppError::Validation(format!("Quantity must be positive, got {}", qty)));
    }
    Ok(())
}

fn insufficient(row: &PartInventory, qty: i32) -> AppError {
    AppError::InsufficientStock(format!(
        "inventory #{} ({}) has {} unit(s), {} requested",
        row.id, row.condition, row.quantity, qty
    ))
}

/// Audit remarks for a stock movement, embedding the hardware it concerns
pub fn stock_remarks(verb: &str, qty: i32, reason: &str, context: Option<&Hardware>) -> String {
    let mut remarks = format!("{} {} unit(s): {}", verb, qty, reason);
    if let Some(hardware) = context {
        remarks.push_str(&format!(" [hardware {} #{}]", hardware.hostname, hardware.id));
    }
    remarks
}
