// src/services/mod.rs

pub mod allocation_service;
pub mod auth_service;
pub mod request_service;
pub mod validation;
