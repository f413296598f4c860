// src/store/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AllocationStore, PartyFilter, RequestStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::allocation::{AllocationModel, AllocationStatus};
use crate::models::request::{AllocationRequestModel, RequestStatus, StatusChange};
use crate::models::user::{UserModel, UserType};

/// Newest first. Walking the vector backwards keeps later inserts ahead of
/// earlier ones that share a timestamp.
fn newest_first<T: Clone, K: Ord>(items: &[T], key: impl Fn(&T) -> K, keep: impl Fn(&T) -> bool) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().filter(|item| keep(item)).cloned().collect();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserModel>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str, kind: UserType) -> AppResult<Option<UserModel>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email && u.kind == kind).cloned())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserModel>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self, kind: Option<UserType>) -> AppResult<Vec<UserModel>> {
        let users = self.users.read().await;
        Ok(newest_first(&users, |u| u.created_at, |u| kind.map_or(true, |k| u.kind == k)))
    }

    async fn insert(&self, user: &UserModel) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email && u.kind == user.kind) {
            return Err(AppError::Conflict("User with this email already exists".into()));
        }
        users.push(user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAllocationStore {
    allocations: RwLock<Vec<AllocationModel>>,
}

fn is_active_pair(a: &AllocationModel, student_id: &str, teacher_id: &str) -> bool {
    a.status == AllocationStatus::Active && a.student_id == student_id && a.teacher_id == teacher_id
}

#[async_trait]
impl AllocationStore for MemoryAllocationStore {
    async fn find_active_pair(
        &self,
        student_id: &str,
        teacher_id: &str,
    ) -> AppResult<Option<AllocationModel>> {
        let allocations = self.allocations.read().await;
        Ok(allocations
            .iter()
            .find(|a| is_active_pair(a, student_id, teacher_id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AllocationModel>> {
        let allocations = self.allocations.read().await;
        Ok(allocations.iter().find(|a| a.id == id).cloned())
    }

    async fn list_active(&self, filter: Option<&PartyFilter>) -> AppResult<Vec<AllocationModel>> {
        let allocations = self.allocations.read().await;
        Ok(newest_first(
            &allocations,
            |a| a.created_at,
            |a| {
                a.status == AllocationStatus::Active
                    && match filter {
                        Some(f) if f.user_type == UserType::Student => a.student_id == f.user_id,
                        Some(f) => a.teacher_id == f.user_id,
                        None => true,
                    }
            },
        ))
    }

    async fn insert(&self, allocation: &AllocationModel) -> AppResult<()> {
        let mut allocations = self.allocations.write().await;
        if allocation.status == AllocationStatus::Active
            && allocations
                .iter()
                .any(|a| is_active_pair(a, &allocation.student_id, &allocation.teacher_id))
        {
            return Err(AppError::Conflict(
                "Allocation already exists for this student-teacher pair".into(),
            ));
        }
        allocations.push(allocation.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        from: AllocationStatus,
        to: AllocationStatus,
    ) -> AppResult<Option<AllocationModel>> {
        let mut allocations = self.allocations.write().await;
        let Some(allocation) = allocations.iter_mut().find(|a| a.id == id && a.status == from) else {
            return Ok(None);
        };
        allocation.status = to;
        allocation.updated_at = chrono::Utc::now();
        Ok(Some(allocation.clone()))
    }
}

#[derive(Default)]
pub struct MemoryRequestStore {
    requests: RwLock<Vec<AllocationRequestModel>>,
}

fn is_pending_pair(r: &AllocationRequestModel, requester_id: &str, target_id: &str) -> bool {
    r.status == RequestStatus::Pending && r.requester_id == requester_id && r.target_id == target_id
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn find_pending_pair(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> AppResult<Option<AllocationRequestModel>> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .find(|r| is_pending_pair(r, requester_id, target_id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AllocationRequestModel>> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, filter: Option<&PartyFilter>) -> AppResult<Vec<AllocationRequestModel>> {
        let requests = self.requests.read().await;
        Ok(newest_first(
            &requests,
            |r| r.created_at,
            |r| filter.map_or(true, |f| r.requester_id == f.user_id && r.requester_type == f.user_type),
        ))
    }

    async fn insert(&self, request: &AllocationRequestModel) -> AppResult<()> {
        let mut requests = self.requests.write().await;
        if request.status == RequestStatus::Pending
            && requests
                .iter()
                .any(|r| is_pending_pair(r, &request.requester_id, &request.target_id))
        {
            return Err(AppError::Conflict("Request already exists for this pairing".into()));
        }
        requests.push(request.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        from: RequestStatus,
        change: &StatusChange,
    ) -> AppResult<Option<AllocationRequestModel>> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests.iter_mut().find(|r| r.id == id && r.status == from) else {
            return Ok(None);
        };
        request.status = change.status;
        if change.allocation_id.is_some() {
            request.allocation_id = change.allocation_id.clone();
            request.allocated_at = change.allocated_at;
        }
        request.updated_at = change.updated_at;
        Ok(Some(request.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_id;
    use chrono::{Duration, Utc};

    fn allocation(student_id: &str, teacher_id: &str, age_minutes: i64) -> AllocationModel {
        let created = Utc::now() - Duration::minutes(age_minutes);
        AllocationModel {
            id: new_id(),
            student_id: student_id.into(),
            teacher_id: teacher_id.into(),
            student_name: "Asha".into(),
            teacher_name: "Ravi".into(),
            subjects: vec![],
            fees: 1000,
            time: "17:00".into(),
            days: vec!["Mon".into()],
            start_date: created,
            status: AllocationStatus::Active,
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn active_pair_is_unique_under_the_write_lock() {
        let store = MemoryAllocationStore::default();
        let (student, teacher) = (new_id(), new_id());
        store.insert(&allocation(&student, &teacher, 0)).await.unwrap();

        let err = store.insert(&allocation(&student, &teacher, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn closed_allocations_free_the_pair() {
        let store = MemoryAllocationStore::default();
        let (student, teacher) = (new_id(), new_id());
        let first = allocation(&student, &teacher, 0);
        store.insert(&first).await.unwrap();

        let closed = store
            .update_status(&first.id, AllocationStatus::Active, AllocationStatus::Completed)
            .await
            .unwrap();
        assert_eq!(closed.unwrap().status, AllocationStatus::Completed);
        assert!(store.find_active_pair(&student, &teacher).await.unwrap().is_none());
        store.insert(&allocation(&student, &teacher, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn stale_status_writes_match_nothing() {
        let store = MemoryAllocationStore::default();
        let a = allocation(&new_id(), &new_id(), 0);
        store.insert(&a).await.unwrap();

        let missed = store
            .update_status(&a.id, AllocationStatus::Completed, AllocationStatus::Cancelled)
            .await
            .unwrap();
        assert!(missed.is_none());
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_filtered_by_side() {
        let store = MemoryAllocationStore::default();
        let (student, teacher) = (new_id(), new_id());
        let old = allocation(&student, &new_id(), 30);
        let new = allocation(&student, &teacher, 5);
        let other = allocation(&new_id(), &teacher, 10);
        for a in [&old, &new, &other] {
            store.insert(a).await.unwrap();
        }

        let filter = PartyFilter { user_id: student.clone(), user_type: UserType::Student };
        let ids: Vec<_> = store
            .list_active(Some(&filter))
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![new.id.clone(), old.id.clone()]);

        let filter = PartyFilter { user_id: teacher, user_type: UserType::Teacher };
        assert_eq!(store.list_active(Some(&filter)).await.unwrap().len(), 2);
        assert_eq!(store.list_active(None).await.unwrap().len(), 3);
    }
}
