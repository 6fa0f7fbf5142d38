//! Hardware repository: units and their installed parts and software

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgConnection, Pool, Postgres};

use super::activity_logs::ActivityLogsRepository;
use crate::{
    error::{AppError, AppResult},
    models::{
        activity_log::{ActionType, LoggableRef, NewActivityLog},
        enums::{PartCondition, PartStatus, SoftwareStatus},
        hardware::{AssignmentUpdate, Hardware, HardwareDetails},
        part::{HardwarePart, PartSpec},
        software::{HardwareSoftware, InstalledSoftware},
    },
    services::collaborators::HardwareAssignments,
};

#[derive(Clone)]
pub struct HardwareRepository {
    pool: Pool<Postgres>,
    activity_logs: ActivityLogsRepository,
}

impl HardwareRepository {
    pub fn new(pool: Pool<Postgres>, activity_logs: ActivityLogsRepository) -> Self {
        Self { pool, activity_logs }
    }

    /// Get hardware with its installed components
    pub async fn get_details(&self, id: i32) -> AppResult<HardwareDetails> {
        let mut conn = self.pool.acquire().await?;
        let hardware = sqlx::query_as::<_, Hardware>("SELECT * FROM hardware WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Hardware {} not found", id)))?;
        self.load_details(&mut conn, hardware).await
    }

    /// Lock a hardware row; serialises maintenance of the same unit
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Hardware> {
        sqlx::query_as::<_, Hardware>("SELECT * FROM hardware WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Hardware {} not found", id)))
    }

    pub async fn lock_by_hostname(&self, conn: &mut PgConnection, hostname: &str) -> AppResult<Hardware> {
        sqlx::query_as::<_, Hardware>("SELECT * FROM hardware WHERE hostname = $1 FOR UPDATE")
            .bind(hostname)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Hardware '{}' not found", hostname)))
    }

    /// Reload a unit's installed components on the given connection
    pub async fn load_details(&self, conn: &mut PgConnection, hardware: Hardware) -> AppResult<HardwareDetails> {
        let parts = sqlx::query_as::<_, HardwarePart>(
            "SELECT * FROM hardware_parts WHERE hardware_id = $1 ORDER BY id",
        )
        .bind(hardware.id)
        .fetch_all(&mut *conn)
        .await?;

        let software = sqlx::query_as::<_, InstalledSoftware>(
            r#"
            SELECT hs.id, hs.hardware_id, hs.software_inventory_id, hs.software_license_id,
                   hs.status, hs.installation_date, hs.remarks,
                   si.software_name, si.software_type, si.version,
                   sl.license_key, sl.account_user
            FROM hardware_software hs
            JOIN software_inventories si ON si.id = hs.software_inventory_id
            LEFT JOIN software_licenses sl ON sl.id = hs.software_license_id
            WHERE hs.hardware_id = $1
            ORDER BY hs.id
            "#,
        )
        .bind(hardware.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(HardwareDetails {
            hardware,
            parts,
            software,
        })
    }

    // -----------------------------------------------------------------------
    // Installed parts
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_part(
        &self,
        conn: &mut PgConnection,
        hardware_id: i32,
        spec: &PartSpec,
        serial_number: Option<&str>,
        condition: PartCondition,
        source_inventory_id: i32,
        remarks: Option<&str>,
    ) -> AppResult<HardwarePart> {
        let row = sqlx::query_as::<_, HardwarePart>(
            r#"
            INSERT INTO hardware_parts (
                hardware_id, part_type, brand, model, specifications,
                serial_number, condition, source_inventory_id, status, installed_date, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), $10)
            RETURNING *
            "#,
        )
        .bind(hardware_id)
        .bind(&spec.part_type)
        .bind(&spec.brand)
        .bind(&spec.model)
        .bind(&spec.specifications)
        .bind(serial_number)
        .bind(condition.as_str())
        .bind(source_inventory_id)
        .bind(i16::from(PartStatus::Installed))
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock an installed part of the given unit
    pub async fn lock_part(&self, conn: &mut PgConnection, hardware_id: i32, id: i32) -> AppResult<HardwarePart> {
        sqlx::query_as::<_, HardwarePart>(
            "SELECT * FROM hardware_parts WHERE id = $1 AND hardware_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(hardware_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Part {} is not installed on hardware {}", id, hardware_id))
        })
    }

    pub async fn update_part_details(
        &self,
        conn: &mut PgConnection,
        id: i32,
        serial_number: Option<&str>,
        remarks: Option<&str>,
    ) -> AppResult<HardwarePart> {
        let row = sqlx::query_as::<_, HardwarePart>(
            r#"
            UPDATE hardware_parts
            SET serial_number = COALESCE($2, serial_number),
                remarks = COALESCE($3, remarks)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(serial_number)
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Mark a part removed; the row is deleted right after by the caller
    pub async fn mark_part_removed(&self, conn: &mut PgConnection, id: i32, remarks: &str) -> AppResult<HardwarePart> {
        let row = sqlx::query_as::<_, HardwarePart>(
            r#"
            UPDATE hardware_parts
            SET status = $2, removed_date = NOW(), remarks = NULLIF($3, '')
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(i16::from(PartStatus::Removed))
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn delete_part(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM hardware_parts WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Installed software
    // -----------------------------------------------------------------------

    pub async fn insert_software(
        &self,
        conn: &mut PgConnection,
        hardware_id: i32,
        software_inventory_id: i32,
        software_license_id: Option<i32>,
        remarks: Option<&str>,
    ) -> AppResult<HardwareSoftware> {
        let row = sqlx::query_as::<_, HardwareSoftware>(
            r#"
            INSERT INTO hardware_software (
                hardware_id, software_inventory_id, software_license_id,
                status, installation_date, remarks
            )
            VALUES ($1, $2, $3, $4, NOW(), $5)
            RETURNING *
            "#,
        )
        .bind(hardware_id)
        .bind(software_inventory_id)
        .bind(software_license_id)
        .bind(i16::from(SoftwareStatus::Active))
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock an installed software row of the given unit
    pub async fn lock_software(
        &self,
        conn: &mut PgConnection,
        hardware_id: i32,
        id: i32,
    ) -> AppResult<HardwareSoftware> {
        sqlx::query_as::<_, HardwareSoftware>(
            "SELECT * FROM hardware_software WHERE id = $1 AND hardware_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(hardware_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Software {} is not installed on hardware {}", id, hardware_id))
        })
    }

    pub async fn mark_software_uninstalled(
        &self,
        conn: &mut PgConnection,
        id: i32,
        remarks: &str,
    ) -> AppResult<HardwareSoftware> {
        let row = sqlx::query_as::<_, HardwareSoftware>(
            r#"
            UPDATE hardware_software
            SET status = $2, uninstall_date = NOW(), remarks = NULLIF($3, '')
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(i16::from(SoftwareStatus::Uninstalled))
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn delete_software(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM hardware_software WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HardwareAssignments for HardwareRepository {
    async fn update_assignment(
        &self,
        conn: &mut PgConnection,
        hardware_id: i32,
        update: &AssignmentUpdate,
        actor_id: i32,
    ) -> AppResult<()> {
        let before = self.lock(conn, hardware_id).await?;

        let after = sqlx::query_as::<_, Hardware>(
            r#"
            UPDATE hardware
            SET issued_to = $2, location = COALESCE($3, location),
                date_issued = $4, modif_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(hardware_id)
        .bind(update.issued_to)
        .bind(&update.location)
        .bind(update.date_issued)
        .fetch_one(&mut *conn)
        .await?;

        let entry = NewActivityLog::new(LoggableRef::Hardware(hardware_id), ActionType::HardwareAssigned, actor_id)
            .old_values(json!({
                "issued_to": before.issued_to,
                "location": before.location,
                "date_issued": before.date_issued,
            }))
            .new_values(json!({
                "issued_to": after.issued_to,
                "location": after.location,
                "date_issued": after.date_issued,
            }))
            .remarks(format!("{} issued to employee #{}", after.hostname, update.issued_to));
        self.activity_logs.append(conn, &entry).await?;

        Ok(())
    }
}
