use actix_web::{web, HttpResponse};

use crate::controllers;
use crate::error::AppError;

mod allocation_routes; // Module for allocation endpoints
mod request_routes; // Module for request endpoints
mod user_routes; // Module for user endpoints

/// Malformed bodies and query strings get the same JSON envelope as every other error.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::bad_request(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::bad_request(format!("Invalid query string: {}", err)).into()
    }));
}

pub fn init(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    cfg.route("/health", web::get().to(controllers::health)).service(
        web::scope("/api")
            .configure(user_routes::init) // Register user routes
            .configure(allocation_routes::init) // Register allocation routes
            .configure(request_routes::init), // Register request routes
    );
}

/// A scope that answers any request none of its handlers take with 405.
pub(crate) fn scope(path: &str) -> actix_web::Scope {
    web::scope(path).default_service(web::to(|| async {
        HttpResponse::from_error(AppError::MethodNotAllowed("Method not allowed".into()))
    }))
}
