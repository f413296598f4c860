use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Active => "active",
            AllocationStatus::Completed => "completed",
            AllocationStatus::Cancelled => "cancelled",
        }
    }

    /// Only an active allocation can be closed, and closing is final.
    pub fn can_transition_to(&self, next: AllocationStatus) -> bool {
        matches!(
            (self, next),
            (AllocationStatus::Active, AllocationStatus::Completed)
                | (AllocationStatus::Active, AllocationStatus::Cancelled)
        )
    }
}

/// A confirmed student–teacher pairing.
///
/// At most one `active` allocation exists per `(student_id, teacher_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationModel {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub student_id: String,
    pub teacher_id: String,
    pub student_name: String,
    pub teacher_name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Monthly fee in whole rupees.
    pub fees: u32,
    /// Free-form time slot, e.g. "17:00-18:00".
    pub time: String,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(with = "timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub status: AllocationStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}
