// src/services/allocation_service.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::allocation::{AllocationModel, AllocationStatus};
use crate::models::{new_id, timestamp};
use crate::services::validation::{non_blank, FieldErrors};
use crate::store::{AllocationStore, PartyFilter};

/// Body of `POST /allocations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationForm {
    pub student_id: String,
    pub teacher_id: String,
    pub student_name: String,
    pub teacher_name: String,
    pub subjects: Option<Vec<String>>,
    pub fees: u32,
    pub time: String,
    pub days: Option<Vec<String>>,
    #[serde(default, with = "timestamp::option")]
    pub start_date: Option<DateTime<Utc>>,
    pub status: Option<AllocationStatus>,
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| non_blank(Some(v)))
        .collect()
}

/// Records a pairing. Only one active allocation may exist per student-teacher pair.
pub async fn create_allocation(
    allocations: &dyn AllocationStore,
    form: AllocationForm,
) -> AppResult<AllocationModel> {
    let mut errors = FieldErrors::new();
    errors
        .check_id(&form.student_id, "studentId")
        .check_id(&form.teacher_id, "teacherId")
        .check(form.student_id != form.teacher_id, "Student and teacher must differ")
        .check(!form.student_name.trim().is_empty(), "Student name is required")
        .check(!form.teacher_name.trim().is_empty(), "Teacher name is required")
        .check(!form.time.trim().is_empty(), "Time is required");
    errors.finish()?;

    let status = form.status.unwrap_or_default();
    if status == AllocationStatus::Active
        && allocations
            .find_active_pair(&form.student_id, &form.teacher_id)
            .await?
            .is_some()
    {
        log::warn!(
            "Active allocation already exists for student {} and teacher {}",
            form.student_id,
            form.teacher_id
        );
        return Err(AppError::bad_request(
            "Allocation already exists for this student-teacher pair",
        ));
    }

    let now = Utc::now();
    let allocation = AllocationModel {
        id: new_id(),
        student_id: form.student_id,
        teacher_id: form.teacher_id,
        student_name: form.student_name.trim().to_string(),
        teacher_name: form.teacher_name.trim().to_string(),
        subjects: clean_list(form.subjects),
        fees: form.fees,
        time: form.time.trim().to_string(),
        days: clean_list(form.days),
        start_date: form.start_date.unwrap_or(now),
        status,
        created_at: now,
        updated_at: now,
    };

    allocations.insert(&allocation).await?;
    log::info!(
        "Allocation {} created: student {} with teacher {}",
        allocation.id,
        allocation.student_id,
        allocation.teacher_id
    );
    Ok(allocation)
}

/// Active allocations, newest first, optionally for one user's side.
pub async fn list_allocations(
    allocations: &dyn AllocationStore,
    filter: Option<PartyFilter>,
) -> AppResult<Vec<AllocationModel>> {
    allocations.list_active(filter.as_ref()).await
}

/// Closes an active allocation as completed or cancelled.
pub async fn update_allocation_status(
    allocations: &dyn AllocationStore,
    id: &str,
    next: AllocationStatus,
) -> AppResult<AllocationModel> {
    let current = allocations
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Allocation not found"))?;

    if !current.status.can_transition_to(next) {
        return Err(AppError::bad_request(format!(
            "Cannot change allocation status from {} to {}",
            current.status.as_str(),
            next.as_str()
        )));
    }

    let updated = allocations
        .update_status(id, current.status, next)
        .await?
        .ok_or_else(|| AppError::Conflict("Allocation was modified concurrently".into()))?;
    log::info!("Allocation {} is now {}", id, next.as_str());
    Ok(updated)
}
