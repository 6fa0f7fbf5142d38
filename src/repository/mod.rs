//! Repository layer for database operations
//!
//! Methods taking a `&mut PgConnection` run on the caller's transaction;
//! methods without one read straight from the pool.

pub mod activity_logs;
pub mod employees;
pub mod hardware;
pub mod issuances;
pub mod parts;
pub mod software;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub parts: parts::PartsRepository,
    pub software: software::SoftwareRepository,
    pub hardware: hardware::HardwareRepository,
    pub issuances: issuances::IssuancesRepository,
    pub activity_logs: activity_logs::ActivityLogsRepository,
    pub employees: employees::EmployeesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        let activity_logs = activity_logs::ActivityLogsRepository::new(pool.clone());
        Self {
            parts: parts::PartsRepository::new(pool.clone()),
            software: software::SoftwareRepository::new(pool.clone()),
            hardware: hardware::HardwareRepository::new(pool.clone(), activity_logs.clone()),
            issuances: issuances::IssuancesRepository::new(pool.clone()),
            employees: employees::EmployeesRepository::new(pool.clone()),
            activity_logs,
            pool,
        }
    }
}
