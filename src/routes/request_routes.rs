// src/routes/request_routes.rs

use actix_web::web;

use super::scope;
use crate::controllers::request_controller::{
    allocate_request, create_request, list_requests, update_request,
};

/// Registers `/requests`, `/requests/{id}` and the admin allocate action.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        scope("/requests")
            .service(list_requests)
            .service(create_request)
            .service(update_request)
            .service(allocate_request),
    );
}
