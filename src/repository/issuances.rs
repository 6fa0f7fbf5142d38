//! Issuances repository: headers, component details and acknowledgements

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AcknowledgementStatus, IssuanceType},
        issuance::{Acknowledgement, ComponentDetail, Issuance, IssuanceDetails},
    },
};

/// Advisory lock key serialising issuance-number generation
const ISSUANCE_SEQUENCE_LOCK: i64 = 0x4953_5355_414e_4345;

#[derive(Clone)]
pub struct IssuancesRepository {
    pool: Pool<Postgres>,
}

impl IssuancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an issuance with its component details and acknowledgement
    pub async fn get_details(&self, id: i32) -> AppResult<IssuanceDetails> {
        let issuance = sqlx::query_as::<_, Issuance>("SELECT * FROM issuances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issuance {} not found", id)))?;

        let components = sqlx::query_as::<_, ComponentDetail>(
            "SELECT * FROM issuance_component_details WHERE issuance_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let acknowledgement = sqlx::query_as::<_, Acknowledgement>(
            "SELECT * FROM acknowledgements WHERE issuance_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(IssuanceDetails {
            issuance,
            components,
            acknowledgement,
        })
    }

    /// Issuances an employee still has to acknowledge
    pub async fn pending_for(&self, employee_id: i32) -> AppResult<Vec<Issuance>> {
        let rows = sqlx::query_as::<_, Issuance>(
            r#"
            SELECT i.* FROM issuances i
            JOIN acknowledgements a ON a.issuance_id = i.id
            WHERE a.acknowledged_by = $1 AND a.status = $2
            ORDER BY i.crea_date DESC
            "#,
        )
        .bind(employee_id)
        .bind(i16::from(AcknowledgementStatus::Pending))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Take the transaction-scoped lock guarding the issuance sequence
    pub async fn lock_sequence(&self, conn: &mut PgConnection) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ISSUANCE_SEQUENCE_LOCK)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Number of the most recently created issuance, optionally restricted to a prefix
    pub async fn last_number(&self, conn: &mut PgConnection, starting_with: Option<&str>) -> AppResult<Option<String>> {
        let number = match starting_with {
            Some(prefix) => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT issuance_number FROM issuances
                    WHERE starts_with(issuance_number, $1)
                    ORDER BY id DESC LIMIT 1
                    "#,
                )
                .bind(prefix)
                .fetch_optional(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, String>(
                    "SELECT issuance_number FROM issuances ORDER BY id DESC LIMIT 1",
                )
                .fetch_optional(&mut *conn)
                .await?
            }
        };
        Ok(number)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_issuance(
        &self,
        conn: &mut PgConnection,
        issuance_number: &str,
        issuance_type: IssuanceType,
        hardware_id: i32,
        issued_to: i32,
        created_by: i32,
        remarks: Option<&str>,
    ) -> AppResult<Issuance> {
        let row = sqlx::query_as::<_, Issuance>(
            r#"
            INSERT INTO issuances (issuance_number, issuance_type, hardware_id, issued_to, created_by, remarks)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(issuance_number)
        .bind(i16::from(issuance_type))
        .bind(hardware_id)
        .bind(issued_to)
        .bind(created_by)
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_component_detail(
        &self,
        conn: &mut PgConnection,
        issuance_id: i32,
        operation_type: &str,
        component_type: &str,
        old_component: Option<&serde_json::Value>,
        new_component: Option<&serde_json::Value>,
        reason: Option<&str>,
        remarks: Option<&str>,
    ) -> AppResult<ComponentDetail> {
        let row = sqlx::query_as::<_, ComponentDetail>(
            r#"
            INSERT INTO issuance_component_details (
                issuance_id, operation_type, component_type,
                old_component, new_component, reason, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(issuance_id)
        .bind(operation_type)
        .bind(component_type)
        .bind(old_component)
        .bind(new_component)
        .bind(reason)
        .bind(remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Create the pending acknowledgement of an issuance
    pub async fn insert_acknowledgement(
        &self,
        conn: &mut PgConnection,
        issuance_id: i32,
        acknowledged_by: i32,
    ) -> AppResult<Acknowledgement> {
        let row = sqlx::query_as::<_, Acknowledgement>(
            r#"
            INSERT INTO acknowledgements (issuance_id, acknowledged_by, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(issuance_id)
        .bind(acknowledged_by)
        .bind(i16::from(AcknowledgementStatus::Pending))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn lock_acknowledgement(&self, conn: &mut PgConnection, issuance_id: i32) -> AppResult<Acknowledgement> {
        sqlx::query_as::<_, Acknowledgement>(
            "SELECT * FROM acknowledgements WHERE issuance_id = $1 FOR UPDATE",
        )
        .bind(issuance_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issuance {} has no acknowledgement", issuance_id)))
    }

    pub async fn mark_acknowledged(&self, conn: &mut PgConnection, id: i32) -> AppResult<Acknowledgement> {
        let row = sqlx::query_as::<_, Acknowledgement>(
            r#"
            UPDATE acknowledgements
            SET status = $2, acknowledged_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(i16::from(AcknowledgementStatus::Acknowledged))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}
