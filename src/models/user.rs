use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, timestamp};

/// Which side of the marketplace an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Teacher,
}

impl UserType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "student" => Some(UserType::Student),
            "teacher" => Some(UserType::Teacher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored account.
///
/// Note:
/// - `_id` is kept as the hex form of an ObjectId.
/// - `(email, type)` is unique, so one email can hold a student and a teacher account.
/// - `password` is a bcrypt hash and never leaves the service; see [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,

    #[serde(rename = "type")]
    pub kind: UserType,

    /// Lowercased and trimmed before storage.
    pub email: String,

    pub password: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default)]
    pub subjects: Vec<String>,

    /// School class, students only.
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Teachers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,

    /// Teachers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// The shape of a user in every API response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: UserType,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub subjects: Vec<String>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for PublicUser {
    fn from(user: UserModel) -> Self {
        PublicUser {
            id: user.id,
            kind: user.kind,
            email: user.email,
            name: user.name,
            phone: user.phone,
            city: user.city,
            subjects: user.subjects,
            class_name: user.class_name,
            experience: user.experience,
            qualification: user.qualification,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
