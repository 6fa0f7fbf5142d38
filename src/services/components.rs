//! Hardware component orchestrator
//!
//! Installs, removes and replaces parts and software on a hardware unit,
//! keeping stock, license counters and the audit trail consistent. The
//! primitives run on a caller-supplied transaction so several of them can be
//! grouped into one issuance; the `*_component` methods open their own.

use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgConnection;

use super::{
    activity_log::ActivityLogService, allocator::ComponentAllocator, ledger::InventoryLedger, retry_on_contention,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        activity_log::{ActionType, LoggableRef, NewActivityLog},
        enums::PartCondition,
        hardware::{Hardware, HardwareDetails},
        issuance::{ComponentChange, ExistingComponent, NewComponent},
        part::{HardwarePart, InstallPart, PartSpec, RemovePart, UpdatePartDetails},
        software::{HardwareSoftware, InstallSoftware, SoftwareInventory, SoftwareLicense, UninstallSoftware},
    },
    repository::Repository,
};

/// Snapshots of the component taken off and put on by one change
#[derive(Debug, Clone, Default)]
pub struct ChangeOutcome {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

#[derive(Clone)]
pub struct ComponentsService {
    repository: Repository,
    allocator: ComponentAllocator,
    ledger: InventoryLedger,
    activity: ActivityLogService,
}

impl ComponentsService {
    pub fn new(
        repository: Repository,
        allocator: ComponentAllocator,
        ledger: InventoryLedger,
        activity: ActivityLogService,
    ) -> Self {
        Self {
            repository,
            allocator,
            ledger,
            activity,
        }
    }

    /// Hardware with its installed components
    pub async fn hardware_details(&self, hardware_id: i32) -> AppResult<HardwareDetails> {
        self.repository.hardware.get_details(hardware_id).await
    }

    // -----------------------------------------------------------------------
    // Composite operations, one transaction each
    // -----------------------------------------------------------------------

    pub async fn add_component(
        &self,
        hardware_id: i32,
        component: NewComponent,
        actor_id: i32,
    ) -> AppResult<HardwareDetails> {
        self.run(hardware_id, ComponentChange::Add(component), actor_id).await
    }

    pub async fn remove_component(
        &self,
        hardware_id: i32,
        component: ExistingComponent,
        actor_id: i32,
    ) -> AppResult<HardwareDetails> {
        self.run(hardware_id, ComponentChange::Remove(component), actor_id).await
    }

    /// Remove then install; a failed install rolls the removal back
    pub async fn replace_component(
        &self,
        hardware_id: i32,
        old: ExistingComponent,
        new: NewComponent,
        actor_id: i32,
    ) -> AppResult<HardwareDetails> {
        self.run(hardware_id, ComponentChange::Replace { old, new }, actor_id).await
    }

    /// Edit serial number or remarks of an installed part
    pub async fn update_part_details(
        &self,
        hardware_id: i32,
        hardware_part_id: i32,
        data: &UpdatePartDetails,
        actor_id: i32,
    ) -> AppResult<HardwarePart> {
        let mut tx = self.repository.pool.begin().await?;
        let hardware = self.repository.hardware.lock(&mut tx, hardware_id).await?;
        let before = self
            .repository
            .hardware
            .lock_part(&mut tx, hardware.id, hardware_part_id)
            .await?;

        let after = self
            .repository
            .hardware
            .update_part_details(
                &mut tx,
                before.id,
                data.serial_number.as_deref(),
                data.remarks.as_deref(),
            )
            .await?;

        let entry = NewActivityLog::new(LoggableRef::Hardware(hardware.id), ActionType::PartUpdated, actor_id)
            .old_values(json!({ "serial_number": before.serial_number, "remarks": before.remarks }))
            .new_values(json!({ "serial_number": after.serial_number, "remarks": after.remarks }))
            .remarks(format!("Updated {} on {}", before.spec(), hardware.hostname));
        self.activity.record(&mut tx, &entry).await?;

        tx.commit().await?;
        Ok(after)
    }

    async fn run(&self, hardware_id: i32, change: ComponentChange, actor_id: i32) -> AppResult<HardwareDetails> {
        let change = &change;
        retry_on_contention("Component change", move || self.run_once(hardware_id, change, actor_id)).await
    }

    async fn run_once(&self, hardware_id: i32, change: &ComponentChange, actor_id: i32) -> AppResult<HardwareDetails> {
        let mut tx = self.repository.pool.begin().await?;
        let hardware = self.repository.hardware.lock(&mut tx, hardware_id).await?;

        self.apply(&mut tx, &hardware, change, actor_id).await?;

        let hostname = hardware.hostname.clone();
        let details = self.repository.hardware.load_details(&mut tx, hardware).await?;
        tx.commit().await?;

        tracing::info!(
            "{} {} on {} by employee #{}",
            change.operation_type().as_str(),
            change.component_type().as_str(),
            hostname,
            actor_id
        );
        Ok(details)
    }

    /// Apply one change on the caller's transaction. The hardware row must
    /// already be locked by the caller.
    pub async fn apply(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        change: &ComponentChange,
        actor_id: i32,
    ) -> AppResult<ChangeOutcome> {
        match change {
            ComponentChange::Add(new) => Ok(ChangeOutcome {
                old: None,
                new: Some(self.install(conn, hardware, new, actor_id).await?),
            }),
            ComponentChange::Remove(old) => Ok(ChangeOutcome {
                old: Some(self.uninstall(conn, hardware, old, actor_id).await?),
                new: None,
            }),
            ComponentChange::Replace { old, new } => {
                let old = self.uninstall(conn, hardware, old, actor_id).await?;
                let new = self.install(conn, hardware, new, actor_id).await?;
                Ok(ChangeOutcome {
                    old: Some(old),
                    new: Some(new),
                })
            }
        }
    }

    async fn install(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        component: &NewComponent,
        actor_id: i32,
    ) -> AppResult<Value> {
        match component {
            NewComponent::Part(data) => {
                let part = self.install_part(conn, hardware, data, actor_id).await?;
                snapshot(&part)
            }
            NewComponent::Software(data) => {
                let (installed, software, license) = self.install_software(conn, hardware, data, actor_id).await?;
                Ok(software_snapshot(&installed, &software, license.as_ref()))
            }
        }
    }

    async fn uninstall(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        component: &ExistingComponent,
        actor_id: i32,
    ) -> AppResult<Value> {
        match component {
            ExistingComponent::Part(data) => {
                let part = self.remove_part(conn, hardware, data, actor_id).await?;
                snapshot(&part)
            }
            ExistingComponent::Software(data) => {
                let (removed, software, license) = self.uninstall_software(conn, hardware, data, actor_id).await?;
                Ok(software_snapshot(&removed, &software, license.as_ref()))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Primitives, on the caller's transaction
    // -----------------------------------------------------------------------

    /// Draw one unit from stock and install it
    pub async fn install_part(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        data: &InstallPart,
        actor_id: i32,
    ) -> AppResult<HardwarePart> {
        let desired = match data.condition.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.parse()?,
            _ => PartCondition::Working,
        };

        let unit = self.allocator.reserve_component(conn, &data.spec, desired).await?;
        let spec = PartSpec::from(&unit.part);

        let part = self
            .repository
            .hardware
            .insert_part(
                conn,
                hardware.id,
                &spec,
                data.serial_number.as_deref(),
                unit.condition,
                unit.inventory.id,
                data.remarks.as_deref(),
            )
            .await?;

        self.ledger
            .decrement_inventory(
                conn,
                unit.inventory.id,
                1,
                &format!("Installed on {}", hardware.hostname),
                actor_id,
                Some(hardware),
            )
            .await?;

        let entry = NewActivityLog::new(LoggableRef::Hardware(hardware.id), ActionType::PartAdded, actor_id)
            .new_values(snapshot(&part)?)
            .remarks(part_added_remarks(&spec, unit.condition, desired));
        self.activity.record(conn, &entry).await?;

        Ok(part)
    }

    /// Take an installed part off and return it to stock
    pub async fn remove_part(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        data: &RemovePart,
        actor_id: i32,
    ) -> AppResult<HardwarePart> {
        let part = self
            .repository
            .hardware
            .lock_part(conn, hardware.id, data.hardware_part_id)
            .await?;
        let condition = PartCondition::from_removal_label(data.removal_condition.as_deref());

        // Audited while the row still exists
        let entry = NewActivityLog::new(LoggableRef::Hardware(hardware.id), ActionType::PartRemoved, actor_id)
            .old_values(snapshot(&part)?)
            .remarks(compose_remarks(&[
                Some(format!("Removed {} ({})", part.spec(), condition).as_str()),
                data.reason.as_deref(),
            ]));
        self.activity.record(conn, &entry).await?;

        self.allocator
            .release_component(conn, hardware, &part, data.removal_condition.as_deref(), actor_id)
            .await?;

        let remarks = compose_remarks(&[
            data.reason.as_deref(),
            Some(condition.as_str()),
            data.remarks.as_deref(),
        ]);
        let removed = self
            .repository
            .hardware
            .mark_part_removed(conn, part.id, &remarks)
            .await?;
        self.repository.hardware.delete_part(conn, part.id).await?;

        Ok(removed)
    }

    /// Install a software title, activating a license when the title tracks keys
    pub async fn install_software(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        data: &InstallSoftware,
        actor_id: i32,
    ) -> AppResult<(HardwareSoftware, SoftwareInventory, Option<SoftwareLicense>)> {
        let software = self.allocator.find_software(conn, &data.spec).await?;

        let license = if software.requires_key_tracking {
            let allocated = self
                .allocator
                .reserve_license(
                    conn,
                    &software,
                    data.license_key.as_deref(),
                    data.account_user.as_deref(),
                )
                .await?;
            let license = self
                .ledger
                .increment_license_activation(
                    conn,
                    allocated.license.id,
                    1,
                    &format!("Installed {} on {}", data.spec, hardware.hostname),
                    actor_id,
                )
                .await?;
            Some(license)
        } else {
            None
        };

        let installed = self
            .repository
            .hardware
            .insert_software(
                conn,
                hardware.id,
                software.id,
                license.as_ref().map(|l| l.id),
                data.remarks.as_deref(),
            )
            .await?;

        let entry = NewActivityLog::new(
            LoggableRef::Hardware(hardware.id),
            ActionType::SoftwareInstalled,
            actor_id,
        )
        .new_values(software_snapshot(&installed, &software, license.as_ref()))
        .remarks(format!("Installed {}", data.spec));
        self.activity.record(conn, &entry).await?;

        Ok((installed, software, license))
    }

    /// Uninstall software and release its license activation
    pub async fn uninstall_software(
        &self,
        conn: &mut PgConnection,
        hardware: &Hardware,
        data: &UninstallSoftware,
        actor_id: i32,
    ) -> AppResult<(HardwareSoftware, SoftwareInventory, Option<SoftwareLicense>)> {
        let installed = self
            .repository
            .hardware
            .lock_software(conn, hardware.id, data.hardware_software_id)
            .await?;
        let software = self
            .repository
            .software
            .get_by_id(conn, installed.software_inventory_id)
            .await?;
        let license = match installed.software_license_id {
            Some(id) => self.repository.software.lock_license(conn, id).await?,
            None => None,
        };

        // Audited while the row still exists
        let entry = NewActivityLog::new(
            LoggableRef::Hardware(hardware.id),
            ActionType::SoftwareUninstalled,
            actor_id,
        )
        .old_values(software_snapshot(&installed, &software, license.as_ref()))
        .remarks(compose_remarks(&[
            Some(format!("Uninstalled {}", software.software_name).as_str()),
            data.reason.as_deref(),
        ]));
        self.activity.record(conn, &entry).await?;

        let license = match license {
            Some(license) if license.current_activations > 0 => Some(
                self.ledger
                    .decrement_license_activation(
                        conn,
                        license.id,
                        1,
                        &format!("Uninstalled {} from {}", software.software_name, hardware.hostname),
                        actor_id,
                    )
                    .await?,
            ),
            other => other,
        };

        let remarks = compose_remarks(&[data.reason.as_deref(), data.remarks.as_deref()]);
        let removed = self
            .repository
            .hardware
            .mark_software_uninstalled(conn, installed.id, &remarks)
            .await?;
        self.repository.hardware.delete_software(conn, installed.id).await?;

        Ok((removed, software, license))
    }
}

fn snapshot<T: Serialize>(row: &T) -> AppResult<Value> {
    serde_json::to_value(row).map_err(|e| AppError::Internal(format!("Failed to snapshot component: {}", e)))
}

fn software_snapshot(
    installed: &HardwareSoftware,
    software: &SoftwareInventory,
    license: Option<&SoftwareLicense>,
) -> Value {
    json!({
        "hardware_software_id": installed.id,
        "software_inventory_id": software.id,
        "software_name": software.software_name,
        "software_type": software.software_type,
        "version": software.version,
        "software_license_id": installed.software_license_id,
        "license": license.map(|l| l.label()),
        "status": installed.status,
        "installation_date": installed.installation_date,
        "uninstall_date": installed.uninstall_date,
        "remarks": installed.remarks,
    })
}

/// Join the non-blank pieces with " | "
pub fn compose_remarks(pieces: &[Option<&str>]) -> String {
    pieces
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn part_added_remarks(spec: &PartSpec, condition: PartCondition, requested: PartCondition) -> String {
    if condition == requested {
        format!("Added {} ({})", spec, condition)
    } else {
        format!("Added {} ({}, requested {})", spec, condition, requested)
    }
}
