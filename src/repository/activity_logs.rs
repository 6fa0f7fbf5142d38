//! Activity log repository (append-only)

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::AppResult,
    models::activity_log::{ActivityLog, LoggableRef, NewActivityLog},
};

#[derive(Clone)]
pub struct ActivityLogsRepository {
    pool: Pool<Postgres>,
}

impl ActivityLogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry on the caller's transaction so it rolls back with the data it describes
    pub async fn append(&self, conn: &mut PgConnection, entry: &NewActivityLog) -> AppResult<ActivityLog> {
        let row = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (
                loggable_type, loggable_id, action_type, action_by,
                action_at, old_values, new_values, remarks
            )
            VALUES ($1, $2, $3, $4, NOW(), $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(entry.subject.type_name())
        .bind(entry.subject.id())
        .bind(entry.action.as_str())
        .bind(entry.action_by)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.remarks)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Entries about one entity, newest first
    pub async fn for_subject(&self, subject: LoggableRef) -> AppResult<Vec<ActivityLog>> {
        let rows = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_logs
            WHERE loggable_type = $1 AND loggable_id = $2
            ORDER BY action_at DESC, id DESC
            "#,
        )
        .bind(subject.type_name())
        .bind(subject.id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
