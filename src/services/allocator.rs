//! Component allocator: picks the inventory row or license backing an install
//! and decides where removed parts go back to.

use sqlx::PgConnection;

use super::ledger::InventoryLedger;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PartCondition,
        hardware::Hardware,
        part::{AllocatedUnit, HardwarePart, PartInventory, PartSpec},
        software::{AllocatedLicense, LicenseIdentifier, SoftwareInventory, SoftwareSpec},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ComponentAllocator {
    repository: Repository,
    ledger: InventoryLedger,
}

impl ComponentAllocator {
    pub fn new(repository: Repository, ledger: InventoryLedger) -> Self {
        Self { repository, ledger }
    }

    /// Lock a stocked inventory row for the part, preferring the desired
    /// condition. Does not decrement; the caller does once the install is written.
    pub async fn reserve_component(
        &self,
        conn: &mut PgConnection,
        spec: &PartSpec,
        desired: PartCondition,
    ) -> AppResult<AllocatedUnit> {
        let part = self
            .repository
            .parts
            .find_by_spec(conn, spec)
            .await?
            .ok_or_else(|| AppError::PartNotFound(spec.to_string()))?;

        if let Some(inventory) = self
            .repository
            .parts
            .lock_inventory_by_condition(conn, part.id, desired)
            .await?
        {
            if inventory.quantity > 0 {
                return Ok(AllocatedUnit {
                    part,
                    inventory,
                    condition: desired,
                    fell_back: false,
                });
            }
        }

        let inventory = self
            .repository
            .parts
            .lock_any_stocked(conn, part.id)
            .await?
            .ok_or_else(|| AppError::NoInventoryAvailable(spec.to_string()))?;
        let condition = inventory.condition();

        tracing::warn!(
            "No {} stock for {}; falling back to {} inventory #{} ({} left)",
            desired, spec, condition, inventory.id, inventory.quantity
        );

        Ok(AllocatedUnit {
            part,
            inventory,
            condition,
            fell_back: true,
        })
    }

    /// Resolve a software title from the catalog
    pub async fn find_software(&self, conn: &mut PgConnection, spec: &SoftwareSpec) -> AppResult<SoftwareInventory> {
        self.repository
            .software
            .find_by_spec(conn, spec)
            .await?
            .ok_or_else(|| AppError::SoftwareNotFound(spec.to_string()))
    }

    /// Lock the license designated by key (preferred) or account user,
    /// refusing it when no activation is left.
    pub async fn reserve_license(
        &self,
        conn: &mut PgConnection,
        software: &SoftwareInventory,
        license_key: Option<&str>,
        account_user: Option<&str>,
    ) -> AppResult<AllocatedLicense> {
        let identifier = LicenseIdentifier::from_parts(license_key, account_user, &software.software_name)?;

        let license = self
            .repository
            .software
            .lock_license_by_identifier(conn, software.id, &identifier)
            .await?
            .ok_or_else(|| {
                AppError::LicenseNotFound(format!("{} for {}", identifier, software.software_name))
            })?;

        if license.remaining_activations() == 0 {
            return Err(AppError::LicenseExhausted(format!(
                "{} for {} has {}/{} activations in use",
                license.label(),
                software.software_name,
                license.current_activations,
                license.max_activations
            )));
        }

        Ok(AllocatedLicense {
            software: software.clone(),
            license,
        })
    }

    /// Put a removed part back in stock under the condition its removal label maps to
    pub async fn release_component(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        part: &HardwarePart,
        removal_condition: Option<&str>,
        actor_id: i32,
    ) -> AppResult<PartInventory> {
        let spec = part.spec();
        let catalog = self
            .repository
            .parts
            .find_by_spec(conn, &spec)
            .await?
            .ok_or_else(|| AppError::PartNotFound(spec.to_string()))?;

        let condition = PartCondition::from_removal_label(removal_condition);
        let inventory = self
            .ledger
            .find_or_create_inventory(conn, catalog.id, condition)
            .await?;

        self.ledger
            .increment_inventory(
                conn,
                inventory.id,
                1,
                &format!("Removed from {}", hardware.hostname),
                actor_id,
                Some(hardware),
            )
            .await
    }
}
