//! Business logic services

pub mod activity_log;
pub mod allocator;
pub mod collaborators;
pub mod components;
pub mod issuance_number;
pub mod issuances;
pub mod ledger;

use std::{future::Future, sync::Arc};

use crate::{
    config::IssuanceConfig,
    error::{AppError, AppResult},
    repository::Repository,
};
use collaborators::{EmployeeDirectory, HardwareAssignments};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub ledger: ledger::InventoryLedger,
    pub allocator: allocator::ComponentAllocator,
    pub components: components::ComponentsService,
    pub numbers: issuance_number::IssuanceNumberGenerator,
    pub issuances: issuances::IssuancesService,
    pub activity_log: activity_log::ActivityLogService,
}

impl Services {
    /// Wire services on top of the repository and the outside collaborators
    pub fn new(
        repository: Repository,
        issuance_config: IssuanceConfig,
        assignments: Arc<dyn HardwareAssignments>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        let activity_log = activity_log::ActivityLogService::new(repository.clone(), directory);
        let ledger = ledger::InventoryLedger::new(repository.clone(), activity_log.clone());
        let allocator = allocator::ComponentAllocator::new(repository.clone(), ledger.clone());
        let components = components::ComponentsService::new(
            repository.clone(),
            allocator.clone(),
            ledger.clone(),
            activity_log.clone(),
        );
        let numbers = issuance_number::IssuanceNumberGenerator::new(repository.clone(), issuance_config);
        let issuances = issuances::IssuancesService::new(
            repository,
            components.clone(),
            numbers.clone(),
            activity_log.clone(),
            assignments,
        );

        Self {
            ledger,
            allocator,
            components,
            numbers,
            issuances,
            activity_log,
        }
    }

    /// Services backed entirely by the database: assignments and employee
    /// names come from the repository itself
    pub fn with_repository(repository: Repository, issuance_config: IssuanceConfig) -> Self {
        let assignments = Arc::new(repository.hardware.clone());
        let directory = Arc::new(repository.employees.clone());
        Self::new(repository, issuance_config, assignments, directory)
    }
}

/// Attempts given to a transactional operation before a lock conflict is
/// reported to the caller
pub const CONTENTION_ATTEMPTS: u32 = 3;

/// Run `op` again from the start while Postgres aborts it as a deadlock
/// victim or serialization failure. `op` must open its own transaction.
pub async fn retry_on_contention<T, F, Fut>(operation: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(AppError::Contention(msg)) if attempt < CONTENTION_ATTEMPTS => {
                tracing::warn!(
                    "{} aborted by a lock conflict (attempt {}/{}): {}",
                    operation,
                    attempt,
                    CONTENTION_ATTEMPTS,
                    msg
                );
                attempt += 1;
            }
            other => return other,
        }
    }
}
