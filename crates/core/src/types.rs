//! Shared primitive types.

use serde::{Deserialize, Serialize};

/// Database primary key type (BIGSERIAL).
pub type DbId = i64;

/// UTC timestamp type used across all entities.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Directory role of a person, as stored in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    /// Database column value for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Parse a database column value. Unknown values return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}
