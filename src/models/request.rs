use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserType;
use super::{new_id, timestamp};

/// Lifecycle of an allocation request.
///
/// ```text
/// pending ──► approved ──► allocated
///    │            │
///    ├────────────┴──► rejected
///    └───────────────► allocated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Allocated,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Allocated => "allocated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            "allocated" => Some(RequestStatus::Allocated),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Allocated)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Allocated)
                | (Approved, Rejected) | (Approved, Allocated)
        )
    }
}

/// A proposal pairing a requester with a target of the other user type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequestModel {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub requester_id: String,
    pub requester_type: UserType,
    pub requester_name: String,
    pub target_id: String,
    pub target_type: UserType,
    pub target_name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub allocated_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl AllocationRequestModel {
    /// The student and teacher ids named by this request, in that order.
    pub fn student_and_teacher(&self) -> (&str, &str) {
        match self.requester_type {
            UserType::Student => (&self.requester_id, &self.target_id),
            UserType::Teacher => (&self.target_id, &self.requester_id),
        }
    }
}

/// A status write applied to a stored request.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: RequestStatus,
    pub allocation_id: Option<String>,
    pub allocated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn pending_can_move_anywhere_but_back() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Allocated));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn approved_requests_are_allocated_or_rejected() {
        assert!(Approved.can_transition_to(Allocated));
        assert!(Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_stay_put() {
        for terminal in [Rejected, Allocated] {
            assert!(terminal.is_terminal());
            for next in [Pending, Approved, Rejected, Allocated] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn parse_accepts_only_known_statuses() {
        assert_eq!(RequestStatus::parse("approved"), Some(Approved));
        assert_eq!(RequestStatus::parse("Approved"), None);
        assert_eq!(RequestStatus::parse("done"), None);
    }
}
