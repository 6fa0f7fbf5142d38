//! Activity log service: transactional append and per-entity history

use std::{collections::HashMap, sync::Arc};

use sqlx::PgConnection;

use super::collaborators::EmployeeDirectory;
use crate::{
    error::AppResult,
    models::activity_log::{ActivityLog, ActivityLogEntry, LoggableRef, NewActivityLog},
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityLogService {
    repository: Repository,
    directory: Arc<dyn EmployeeDirectory>,
}

impl ActivityLogService {
    pub fn new(repository: Repository, directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Append an entry inside the caller's transaction
    pub async fn record(&self, conn: &mut PgConnection, entry: &NewActivityLog) -> AppResult<ActivityLog> {
        self.repository.activity_logs.append(conn, entry).await
    }

    /// History of one entity, newest first, with actor names resolved
    pub async fn history(&self, subject: LoggableRef) -> AppResult<Vec<ActivityLogEntry>> {
        let logs = self.repository.activity_logs.for_subject(subject).await?;
        with_actor_names(self.directory.as_ref(), logs).await
    }
}

/// Decorate entries with actor display names, resolving each employee once
pub async fn with_actor_names(
    directory: &dyn EmployeeDirectory,
    logs: Vec<ActivityLog>,
) -> AppResult<Vec<ActivityLogEntry>> {
    let mut names: HashMap<i32, String> = HashMap::new();
    let mut entries = Vec::with_capacity(logs.len());

    for log in logs {
        let actor_name = match names.get(&log.action_by) {
            Some(name) => name.clone(),
            None => {
                let name = directory
                    .display_name(log.action_by)
                    .await?
                    .unwrap_or_else(|| format!("Employee #{}", log.action_by));
                names.insert(log.action_by, name.clone());
                name
            }
        };
        entries.push(ActivityLogEntry { log, actor_name });
    }

    Ok(entries)
}
