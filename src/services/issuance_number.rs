//! Issuance number generator: `<prefix>-<year>-<sequence>`

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::PgConnection;

use crate::{
    config::{IssuanceConfig, SequencePolicy},
    error::AppResult,
    repository::Repository,
};

static ISSUANCE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>.+)-(?P<year>\d{4})-(?P<seq>\d+)$").expect("invalid issuance number pattern")
});

#[derive(Clone)]
pub struct IssuanceNumberGenerator {
    repository: Repository,
    config: IssuanceConfig,
}

impl IssuanceNumberGenerator {
    pub fn new(repository: Repository, config: IssuanceConfig) -> Self {
        Self { repository, config }
    }

    /// Next number for the current year.
    ///
    /// Takes the sequence lock for the rest of the caller's transaction, so
    /// the issuance using the number must be inserted before it commits.
    pub async fn next_issuance_number(&self, conn: &mut PgConnection) -> AppResult<String> {
        self.next_for_year(conn, Utc::now().year()).await
    }

    pub async fn next_for_year(&self, conn: &mut PgConnection, year: i32) -> AppResult<String> {
        self.repository.issuances.lock_sequence(conn).await?;

        let filter = match self.config.sequence_policy {
            SequencePolicy::YearlyReset => Some(format!("{}-{}-", self.config.prefix, year)),
            SequencePolicy::Continuous => None,
        };
        let last = self
            .repository
            .issuances
            .last_number(conn, filter.as_deref())
            .await?;

        Ok(next_number(
            &self.config.prefix,
            self.config.sequence_policy,
            year,
            last.as_deref(),
        ))
    }
}

/// Number following `last`; unparseable or missing predecessors restart at 0001
pub fn next_number(prefix: &str, policy: SequencePolicy, year: i32, last: Option<&str>) -> String {
    let last_seq = last
        .and_then(|number| ISSUANCE_NUMBER.captures(number))
        .filter(|caps| match policy {
            SequencePolicy::YearlyReset => caps["year"].parse::<i32>().ok() == Some(year),
            SequencePolicy::Continuous => true,
        })
        .and_then(|caps| caps["seq"].parse::<u32>().ok())
        .unwrap_or(0);

    format!("{}-{}-{:04}", prefix, year, last_seq + 1)
}
