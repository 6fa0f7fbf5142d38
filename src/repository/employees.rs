//! Employees repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, services::collaborators::EmployeeDirectory};

#[derive(Clone)]
pub struct EmployeesRepository {
    pool: Pool<Postgres>,
}

impl EmployeesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for EmployeesRepository {
    async fn display_name(&self, employee_id: i32) -> AppResult<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT fullname FROM employees WHERE id = $1")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }
}
