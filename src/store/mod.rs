// src/store/mod.rs

//! Storage seams for the three collections.
//!
//! Services only see these traits. `mongo` backs them with MongoDB
//! collections, `memory` with locked vectors for tests and local runs.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::allocation::{AllocationModel, AllocationStatus};
use crate::models::request::{AllocationRequestModel, RequestStatus, StatusChange};
use crate::models::user::{UserModel, UserType};

pub mod memory;
pub mod mongo;

/// Restricts a listing to one user's side of a pairing.
#[derive(Debug, Clone)]
pub struct PartyFilter {
    pub user_id: String,
    pub user_type: UserType,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str, kind: UserType) -> AppResult<Option<UserModel>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserModel>>;
    /// Newest first.
    async fn list(&self, kind: Option<UserType>) -> AppResult<Vec<UserModel>>;
    /// Fails with `Conflict` when `(email, type)` is taken.
    async fn insert(&self, user: &UserModel) -> AppResult<()>;
}

#[async_trait]
pub trait AllocationStore: Send + Sync {
    async fn find_active_pair(
        &self,
        student_id: &str,
        teacher_id: &str,
    ) -> AppResult<Option<AllocationModel>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<AllocationModel>>;
    /// Active allocations only, newest first. A student filter matches
    /// `student_id`, a teacher filter matches `teacher_id`.
    async fn list_active(&self, filter: Option<&PartyFilter>) -> AppResult<Vec<AllocationModel>>;
    /// Fails with `Conflict` when the pair already has an active allocation.
    async fn insert(&self, allocation: &AllocationModel) -> AppResult<()>;
    /// Writes `to` only if the stored status is still `from`. Returns the
    /// updated document, or `None` when nothing matched.
    async fn update_status(
        &self,
        id: &str,
        from: AllocationStatus,
        to: AllocationStatus,
    ) -> AppResult<Option<AllocationModel>>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn find_pending_pair(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> AppResult<Option<AllocationRequestModel>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<AllocationRequestModel>>;
    /// Newest first. A filter matches on the requester side.
    async fn list(&self, filter: Option<&PartyFilter>) -> AppResult<Vec<AllocationRequestModel>>;
    /// Fails with `Conflict` when the pair already has a pending request.
    async fn insert(&self, request: &AllocationRequestModel) -> AppResult<()>;
    /// Applies `change` only if the stored status is still `from`.
    async fn update_status(
        &self,
        id: &str,
        from: RequestStatus,
        change: &StatusChange,
    ) -> AppResult<Option<AllocationRequestModel>>;
}
