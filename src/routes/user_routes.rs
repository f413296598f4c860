// src/routes/user_routes.rs

use actix_web::web;

use super::scope;
use crate::controllers::user_controller::{current_user, list_users, login, register};

/// Initializes the user routes by registering each endpoint within the `/users` scope.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        scope("/users")
            .service(list_users)
            .service(register)
            .service(login)
            .service(current_user),
    );
}
