//! Part catalog and part inventory repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PartCondition,
        part::{Part, PartInventory, PartSpec},
    },
};

#[derive(Clone)]
pub struct PartsRepository {
    pool: Pool<Postgres>,
}

impl PartsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get catalog part by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Part> {
        sqlx::query_as::<_, Part>("SELECT * FROM parts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Part {} not found", id)))
    }

    /// Inventory rows of a catalog part, one per condition
    pub async fn list_inventory(&self, part_id: i32) -> AppResult<Vec<PartInventory>> {
        let rows = sqlx::query_as::<_, PartInventory>(
            "SELECT * FROM part_inventories WHERE part_id = $1 ORDER BY condition",
        )
        .bind(part_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Find catalog part by its (type, brand, model, specifications) key
    pub async fn find_by_spec(&self, conn: &mut PgConnection, spec: &PartSpec) -> AppResult<Option<Part>> {
        let row = sqlx::query_as::<_, Part>(
            r#"
            SELECT * FROM parts
            WHERE part_type = $1 AND brand = $2 AND model = $3 AND specifications = $4
            "#,
        )
        .bind(&spec.part_type)
        .bind(&spec.brand)
        .bind(&spec.model)
        .bind(&spec.specifications)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock an inventory row for the rest of the transaction
    pub async fn lock_inventory(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<PartInventory>> {
        let row = sqlx::query_as::<_, PartInventory>(
            "SELECT * FROM part_inventories WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock the (part, condition) inventory row if it exists
    pub async fn lock_inventory_by_condition(
        &self,
        conn: &mut PgConnection,
        part_id: i32,
        condition: PartCondition,
    ) -> AppResult<Option<PartInventory>> {
        let row = sqlx::query_as::<_, PartInventory>(
            "SELECT * FROM part_inventories WHERE part_id = $1 AND condition = $2 FOR UPDATE",
        )
        .bind(part_id)
        .bind(condition.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock the best stocked inventory row of a part, whatever its condition
    pub async fn lock_any_stocked(&self, conn: &mut PgConnection, part_id: i32) -> AppResult<Option<PartInventory>> {
        let row = sqlx::query_as::<_, PartInventory>(
            r#"
            SELECT * FROM part_inventories
            WHERE part_id = $1 AND quantity > 0
            ORDER BY CASE condition
                WHEN $2 THEN 0
                WHEN $3 THEN 1
                WHEN $4 THEN 2
                ELSE 3
            END, id
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(part_id)
        .bind(PartCondition::Working.as_str())
        .bind(PartCondition::Used.as_str())
        .bind(PartCondition::Unknown.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Insert an empty (part, condition) row unless one already exists
    pub async fn insert_inventory_if_absent(
        &self,
        conn: &mut PgConnection,
        part_id: i32,
        condition: PartCondition,
    ) -> AppResult<Option<PartInventory>> {
        let row = sqlx::query_as::<_, PartInventory>(
            r#"
            INSERT INTO part_inventories (part_id, condition, quantity)
            VALUES ($1, $2, 0)
            ON CONFLICT (part_id, condition) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(part_id)
        .bind(condition.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Add to the quantity of a locked row
    pub async fn add_quantity(&self, conn: &mut PgConnection, id: i32, qty: i32) -> AppResult<PartInventory> {
        let row = sqlx::query_as::<_, PartInventory>(
            r#"
            UPDATE part_inventories
            SET quantity = quantity + $2, modif_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(qty)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Subtract from the quantity, only if enough stock remains.
    /// Returns `None` when the guard rejected the update.
    pub async fn subtract_quantity(
        &self,
        conn: &mut PgConnection,
        id: i32,
        qty: i32,
    ) -> AppResult<Option<PartInventory>> {
        let row = sqlx::query_as::<_, PartInventory>(
            r#"
            UPDATE part_inventories
            SET quantity = quantity - $2, modif_date = NOW()
            WHERE id = $1 AND quantity >= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(qty)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }
}
