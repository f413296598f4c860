// src/state.rs

use std::sync::Arc;

use mongodb::Database;

use crate::store::memory::{MemoryAllocationStore, MemoryRequestStore, MemoryUserStore};
use crate::store::mongo::{MongoAllocationStore, MongoRequestStore, MongoUserStore};
use crate::store::{AllocationStore, RequestStore, UserStore};

/// Token signing settings shared by every worker.
#[derive(Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub allocations: Arc<dyn AllocationStore>,
    pub requests: Arc<dyn RequestStore>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn mongo(db: &Database, auth: AuthSettings) -> Self {
        Self {
            users: Arc::new(MongoUserStore::new(db)),
            allocations: Arc::new(MongoAllocationStore::new(db)),
            requests: Arc::new(MongoRequestStore::new(db)),
            auth,
        }
    }

    pub fn in_memory(auth: AuthSettings) -> Self {
        Self {
            users: Arc::new(MemoryUserStore::default()),
            allocations: Arc::new(MemoryAllocationStore::default()),
            requests: Arc::new(MemoryRequestStore::default()),
            auth,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory state with a fixed secret and the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        Self::in_memory(AuthSettings {
            secret_key: "test-secret".into(),
            access_token_expire_minutes: 60,
            bcrypt_cost: 4,
        })
    }
}
