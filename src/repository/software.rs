//! Software catalog and license repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::software::{LicenseIdentifier, SoftwareInventory, SoftwareLicense, SoftwareSpec},
};

#[derive(Clone)]
pub struct SoftwareRepository {
    pool: Pool<Postgres>,
}

impl SoftwareRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get license by ID
    pub async fn get_license(&self, id: i32) -> AppResult<SoftwareLicense> {
        sqlx::query_as::<_, SoftwareLicense>("SELECT * FROM software_licenses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Software license {} not found", id)))
    }

    /// Find software title by (name, type, version)
    pub async fn find_by_spec(
        &self,
        conn: &mut PgConnection,
        spec: &SoftwareSpec,
    ) -> AppResult<Option<SoftwareInventory>> {
        let row = sqlx::query_as::<_, SoftwareInventory>(
            r#"
            SELECT * FROM software_inventories
            WHERE software_name = $1 AND software_type = $2 AND version = $3
            "#,
        )
        .bind(&spec.software_name)
        .bind(&spec.software_type)
        .bind(&spec.version)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<SoftwareInventory> {
        sqlx::query_as::<_, SoftwareInventory>("SELECT * FROM software_inventories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Software {} not found", id)))
    }

    /// Lock a license row for the rest of the transaction
    pub async fn lock_license(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<SoftwareLicense>> {
        let row = sqlx::query_as::<_, SoftwareLicense>(
            "SELECT * FROM software_licenses WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock the license of a title designated by key or account user
    pub async fn lock_license_by_identifier(
        &self,
        conn: &mut PgConnection,
        software_inventory_id: i32,
        identifier: &LicenseIdentifier,
    ) -> AppResult<Option<SoftwareLicense>> {
        let (column, value) = match identifier {
            LicenseIdentifier::Key(key) => ("license_key", key),
            LicenseIdentifier::Account(user) => ("account_user", user),
        };
        let query = format!(
            "SELECT * FROM software_licenses WHERE software_inventory_id = $1 AND {} = $2 ORDER BY id LIMIT 1 FOR UPDATE",
            column
        );
        let row = sqlx::query_as::<_, SoftwareLicense>(&query)
            .bind(software_inventory_id)
            .bind(value)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Overwrite the activation counter of a locked row
    pub async fn set_activations(
        &self,
        conn: &mut PgConnection,
        id: i32,
        current_activations: i32,
    ) -> AppResult<SoftwareLicense> {
        let row = sqlx::query_as::<_, SoftwareLicense>(
            r#"
            UPDATE software_licenses
            SET current_activations = $2, modif_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(current_activations)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}
