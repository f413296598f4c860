// src/controllers/allocation_controller.rs

use actix_web::{get, patch, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::PartyQuery;
use crate::error::AppResult;
use crate::models::allocation::AllocationStatus;
use crate::services::allocation_service::{self, AllocationForm};
use crate::state::AppState;

/// Body of PATCH /allocations/{id}.
#[derive(Debug, Deserialize)]
pub struct AllocationStatusForm {
    pub status: AllocationStatus,
}

/// POST /allocations
#[post("")]
pub async fn create_allocation(
    form: web::Json<AllocationForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let allocation =
        allocation_service::create_allocation(data.allocations.as_ref(), form.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Allocation created successfully!",
        "allocation": allocation,
    })))
}

/// GET /allocations?userId=&userType=
/// Active allocations, newest first.
#[get("")]
pub async fn list_allocations(
    query: web::Query<PartyQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let allocations =
        allocation_service::list_allocations(data.allocations.as_ref(), query.into_inner().into_filter()?)
            .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "allocations": allocations })))
}

/// PATCH /allocations/{id}
/// Marks an active allocation completed or cancelled.
#[patch("/{id}")]
pub async fn update_allocation(
    path: web::Path<String>,
    form: web::Json<AllocationStatusForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let allocation =
        allocation_service::update_allocation_status(data.allocations.as_ref(), &id, form.status)
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Allocation status updated successfully!",
        "allocation": allocation,
    })))
}
