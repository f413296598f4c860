// src/services/request_service.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::allocation::{AllocationModel, AllocationStatus};
use crate::models::request::{AllocationRequestModel, RequestStatus, StatusChange};
use crate::models::user::{UserModel, UserType};
use crate::models::{is_object_id, new_id, timestamp};
use crate::services::allocation_service::{self, AllocationForm};
use crate::services::validation::{non_blank, FieldErrors};
use crate::store::{AllocationStore, PartyFilter, RequestStore, UserStore};

/// Body of `POST /requests`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestForm {
    pub requester_id: String,
    pub requester_type: UserType,
    pub requester_name: String,
    pub target_id: String,
    pub target_type: UserType,
    pub target_name: String,
    pub subjects: Option<Vec<String>>,
    pub message: Option<String>,
}

/// Body of `PATCH /requests/{id}`. `status` stays a string so an unknown
/// value is reported as "Invalid status" rather than a parse failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusForm {
    pub status: String,
    pub allocation_id: Option<String>,
}

/// Schedule and fee an admin supplies when allocating a request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTerms {
    pub fees: Option<u32>,
    pub time: Option<String>,
    pub days: Option<Vec<String>>,
    #[serde(default, with = "timestamp::option")]
    pub start_date: Option<DateTime<Utc>>,
}

/// Files a request. At most one pending request may exist per requester-target pair.
pub async fn create_request(
    requests: &dyn RequestStore,
    form: RequestForm,
) -> AppResult<AllocationRequestModel> {
    let mut errors = FieldErrors::new();
    errors
        .check_id(&form.requester_id, "requesterId")
        .check_id(&form.target_id, "targetId")
        .check(
            form.requester_type != form.target_type,
            "A request must pair a student with a teacher",
        )
        .check(!form.requester_name.trim().is_empty(), "Requester name is required")
        .check(!form.target_name.trim().is_empty(), "Target name is required");
    errors.finish()?;

    if requests
        .find_pending_pair(&form.requester_id, &form.target_id)
        .await?
        .is_some()
    {
        log::warn!(
            "Pending request already exists from {} to {}",
            form.requester_id,
            form.target_id
        );
        return Err(AppError::bad_request("Request already exists for this pairing"));
    }

    let now = Utc::now();
    let request = AllocationRequestModel {
        id: new_id(),
        requester_id: form.requester_id,
        requester_type: form.requester_type,
        requester_name: form.requester_name.trim().to_string(),
        target_id: form.target_id,
        target_type: form.target_type,
        target_name: form.target_name.trim().to_string(),
        subjects: form
            .subjects
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| non_blank(Some(s)))
            .collect(),
        message: non_blank(form.message),
        status: RequestStatus::Pending,
        allocation_id: None,
        allocated_at: None,
        created_at: now,
        updated_at: now,
    };

    requests.insert(&request).await?;
    log::info!(
        "Request {} filed by {} {} for {} {}",
        request.id,
        request.requester_type,
        request.requester_id,
        request.target_type,
        request.target_id
    );
    Ok(request)
}

/// All requests, or those filed by one user, newest first.
pub async fn list_requests(
    requests: &dyn RequestStore,
    filter: Option<PartyFilter>,
) -> AppResult<Vec<AllocationRequestModel>> {
    requests.list(filter.as_ref()).await
}

/// Moves a request along its lifecycle. Only `approved`, `rejected` and
/// `allocated` can be requested, and only along legal transitions.
pub async fn update_request_status(
    requests: &dyn RequestStore,
    id: &str,
    form: StatusForm,
) -> AppResult<AllocationRequestModel> {
    let next = RequestStatus::parse(&form.status)
        .filter(|s| *s != RequestStatus::Pending)
        .ok_or_else(|| AppError::bad_request("Invalid status"))?;

    let allocation_id = match (next, non_blank(form.allocation_id)) {
        (RequestStatus::Allocated, Some(allocation_id)) => {
            if !is_object_id(&allocation_id) {
                return Err(AppError::bad_request("Invalid allocationId"));
            }
            Some(allocation_id)
        }
        _ => None,
    };

    let current = requests
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))?;

    transition(requests, &current, next, allocation_id).await
}

async fn transition(
    requests: &dyn RequestStore,
    current: &AllocationRequestModel,
    next: RequestStatus,
    allocation_id: Option<String>,
) -> AppResult<AllocationRequestModel> {
    if current.status.is_terminal() {
        return Err(AppError::bad_request(format!(
            "Request is already {}",
            current.status.as_str()
        )));
    }
    if !current.status.can_transition_to(next) {
        return Err(AppError::bad_request(format!(
            "Cannot change request status from {} to {}",
            current.status.as_str(),
            next.as_str()
        )));
    }

    let now = Utc::now();
    let change = StatusChange {
        status: next,
        allocated_at: allocation_id.as_ref().map(|_| now),
        allocation_id,
        updated_at: now,
    };

    let updated = requests
        .update_status(&current.id, current.status, &change)
        .await?
        .ok_or_else(|| AppError::Conflict("Request was modified concurrently".into()))?;
    log::info!(
        "Request {} moved from {} to {}",
        current.id,
        current.status.as_str(),
        next.as_str()
    );
    Ok(updated)
}

async fn find_party(users: &dyn UserStore, id: &str, kind: UserType) -> AppResult<Option<UserModel>> {
    Ok(users.find_by_id(id).await?.filter(|u| u.kind == kind))
}

/// Turns a pending or approved request into an allocation and marks the
/// request `allocated`. If the request changes underneath, the new
/// allocation is cancelled again.
pub async fn allocate_request(
    users: &dyn UserStore,
    allocations: &dyn AllocationStore,
    requests: &dyn RequestStore,
    id: &str,
    terms: AllocationTerms,
) -> AppResult<(AllocationModel, AllocationRequestModel)> {
    let request = requests
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))?;

    if !request.status.can_transition_to(RequestStatus::Allocated) {
        return Err(AppError::bad_request(format!(
            "Request is already {}",
            request.status.as_str()
        )));
    }

    let time = non_blank(terms.time);
    let days: Vec<String> = terms
        .days
        .unwrap_or_default()
        .into_iter()
        .filter_map(|d| non_blank(Some(d)))
        .collect();
    let (Some(fees), Some(time)) = (terms.fees, time) else {
        return Err(AppError::bad_request("Please fill all fields"));
    };
    if days.is_empty() {
        return Err(AppError::bad_request("Please fill all fields"));
    }

    let (student_id, teacher_id) = request.student_and_teacher();
    let student = find_party(users, student_id, UserType::Student).await?;
    let teacher = find_party(users, teacher_id, UserType::Teacher).await?;
    let (Some(student), Some(teacher)) = (student, teacher) else {
        return Err(AppError::not_found("Student or teacher not found"));
    };

    let allocation = allocation_service::create_allocation(
        allocations,
        AllocationForm {
            student_id: student.id,
            teacher_id: teacher.id,
            student_name: student.name,
            teacher_name: teacher.name,
            subjects: Some(request.subjects.clone()),
            fees,
            time,
            days: Some(days),
            start_date: terms.start_date,
            status: Some(AllocationStatus::Active),
        },
    )
    .await?;

    match transition(requests, &request, RequestStatus::Allocated, Some(allocation.id.clone())).await {
        Ok(updated) => Ok((allocation, updated)),
        Err(err) => {
            log::warn!(
                "Cancelling allocation {} after request {} failed to update: {}",
                allocation.id,
                request.id,
                err
            );
            if let Err(cancel_err) = allocations
                .update_status(&allocation.id, AllocationStatus::Active, AllocationStatus::Cancelled)
                .await
            {
                log::error!("Failed to cancel allocation {}: {}", allocation.id, cancel_err);
            }
            Err(err)
        }
    }
}
