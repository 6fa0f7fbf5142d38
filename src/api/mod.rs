//! API handlers for AssetDesk REST endpoints

pub mod hardware;
pub mod health;
pub mod inventory;
pub mod issuances;
pub mod openapi;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, AppResult};

/// Header carrying the acting employee id
pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";

/// Extractor for the employee performing the request
pub struct Actor(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(EMPLOYEE_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(Actor(parse_actor(header)?))
    }
}

fn parse_actor(header: Option<&str>) -> AppResult<i32> {
    let raw = header.ok_or_else(|| AppError::InvalidRequest("Missing X-Employee-Id header".to_string()))?;
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::InvalidRequest(format!("Invalid X-Employee-Id header '{}'", raw)))
}
