//! AssetDesk server
//!
//! IT asset inventory and issuance tracking: stock of spare parts and
//! software licenses, component maintenance on hardware units, issuance
//! records with employee acknowledgement, and an append-only audit trail.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
