// src/controllers/mod.rs

use actix_web::HttpResponse;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::user::UserType;
use crate::store::PartyFilter;

pub mod allocation_controller;
pub mod request_controller;
pub mod user_controller;

/// A `type`-like query parameter. Left empty it means "not given".
pub(crate) fn user_type_param(raw: Option<&str>, field: &str) -> AppResult<Option<UserType>> {
    match raw.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(t) => UserType::parse(t)
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("Invalid {}", field))),
    }
}

/// `?userId=&userType=` on listing endpoints. Both must be non-empty to filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyQuery {
    pub user_id: Option<String>,
    pub user_type: Option<String>,
}

impl PartyQuery {
    pub fn into_filter(self) -> AppResult<Option<PartyFilter>> {
        let user_type = user_type_param(self.user_type.as_deref(), "userType")?;
        Ok(match (self.user_id.filter(|id| !id.is_empty()), user_type) {
            (Some(user_id), Some(user_type)) => Some(PartyFilter { user_id, user_type }),
            _ => None,
        })
    }
}

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
