// src/routes/allocation_routes.rs

use actix_web::web;

use super::scope;
use crate::controllers::allocation_controller::{create_allocation, list_allocations, update_allocation};

/// Registers `/allocations` and `/allocations/{id}`.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        scope("/allocations")
            .service(list_allocations)
            .service(create_allocation)
            .service(update_allocation),
    );
}
