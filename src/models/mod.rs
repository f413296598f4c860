// src/models/mod.rs

use mongodb::bson::oid::ObjectId;

pub mod allocation;
pub mod request;
pub mod timestamp;
pub mod user;

/// Returns a new ObjectId as a hex string. Every document id is stored this way.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// True when `id` is a 24-character hex ObjectId.
pub fn is_object_id(id: &str) -> bool {
    ObjectId::parse_str(id).is_ok()
}
