// src/store/mongo.rs

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection, Database,
};

use super::{AllocationStore, PartyFilter, RequestStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::allocation::{AllocationModel, AllocationStatus};
use crate::models::request::{AllocationRequestModel, RequestStatus, StatusChange};
use crate::models::timestamp;
use crate::models::user::{UserModel, UserType};

pub const USERS: &str = "users";
pub const ALLOCATIONS: &str = "allocations";
pub const REQUESTS: &str = "allocationrequests";

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Maps a unique-index violation to `Conflict`, everything else to `Database`.
fn conflict_on_duplicate(message: &'static str) -> impl Fn(MongoError) -> AppError {
    move |err| {
        if is_duplicate_key(&err) {
            AppError::Conflict(message.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "createdAt": -1 }).build()
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<UserModel>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(USERS) }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str, kind: UserType) -> AppResult<Option<UserModel>> {
        let filter = doc! { "email": email, "type": kind.as_str() };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserModel>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list(&self, kind: Option<UserType>) -> AppResult<Vec<UserModel>> {
        let filter = match kind {
            Some(kind) => doc! { "type": kind.as_str() },
            None => Document::new(),
        };
        let cursor = self.collection.find(filter, newest_first()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, user: &UserModel) -> AppResult<()> {
        self.collection
            .insert_one(user, None)
            .await
            .map_err(conflict_on_duplicate("User with this email already exists"))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoAllocationStore {
    collection: Collection<AllocationModel>,
}

impl MongoAllocationStore {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(ALLOCATIONS) }
    }
}

#[async_trait]
impl AllocationStore for MongoAllocationStore {
    async fn find_active_pair(
        &self,
        student_id: &str,
        teacher_id: &str,
    ) -> AppResult<Option<AllocationModel>> {
        let filter = doc! {
            "studentId": student_id,
            "teacherId": teacher_id,
            "status": AllocationStatus::Active.as_str(),
        };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AllocationModel>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_active(&self, filter: Option<&PartyFilter>) -> AppResult<Vec<AllocationModel>> {
        let mut query = doc! { "status": AllocationStatus::Active.as_str() };
        if let Some(f) = filter {
            let field = match f.user_type {
                UserType::Student => "studentId",
                UserType::Teacher => "teacherId",
            };
            query.insert(field, f.user_id.as_str());
        }
        let cursor = self.collection.find(query, newest_first()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, allocation: &AllocationModel) -> AppResult<()> {
        self.collection
            .insert_one(allocation, None)
            .await
            .map_err(conflict_on_duplicate(
                "Allocation already exists for this student-teacher pair",
            ))?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        from: AllocationStatus,
        to: AllocationStatus,
    ) -> AppResult<Option<AllocationModel>> {
        let filter = doc! { "_id": id, "status": from.as_str() };
        let update = doc! {
            "$set": {
                "status": to.as_str(),
                "updatedAt": timestamp::format(&chrono::Utc::now()),
            }
        };
        Ok(self
            .collection
            .find_one_and_update(filter, update, return_updated())
            .await?)
    }
}

#[derive(Clone)]
pub struct MongoRequestStore {
    collection: Collection<AllocationRequestModel>,
}

impl MongoRequestStore {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(REQUESTS) }
    }
}

#[async_trait]
impl RequestStore for MongoRequestStore {
    async fn find_pending_pair(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> AppResult<Option<AllocationRequestModel>> {
        let filter = doc! {
            "requesterId": requester_id,
            "targetId": target_id,
            "status": RequestStatus::Pending.as_str(),
        };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AllocationRequestModel>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list(&self, filter: Option<&PartyFilter>) -> AppResult<Vec<AllocationRequestModel>> {
        let query = match filter {
            Some(f) => doc! {
                "requesterId": f.user_id.as_str(),
                "requesterType": f.user_type.as_str(),
            },
            None => Document::new(),
        };
        let cursor = self.collection.find(query, newest_first()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, request: &AllocationRequestModel) -> AppResult<()> {
        self.collection
            .insert_one(request, None)
            .await
            .map_err(conflict_on_duplicate("Request already exists for this pairing"))?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        from: RequestStatus,
        change: &StatusChange,
    ) -> AppResult<Option<AllocationRequestModel>> {
        let filter = doc! { "_id": id, "status": from.as_str() };
        let mut set = doc! {
            "status": change.status.as_str(),
            "updatedAt": timestamp::format(&change.updated_at),
        };
        if let Some(allocation_id) = &change.allocation_id {
            set.insert("allocationId", allocation_id.as_str());
            if let Some(at) = &change.allocated_at {
                set.insert("allocatedAt", timestamp::format(at));
            }
        }
        Ok(self
            .collection
            .find_one_and_update(filter, doc! { "$set": set }, return_updated())
            .await?)
    }
}
