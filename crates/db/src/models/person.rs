//! Directory user model.
//!
//! The `users` table is owned by the external identity system; this
//! service only ever reads it, so there are no create/update DTOs.

use rollcall_core::types::{DbId, Role, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub organization_id: DbId,
    pub department_id: Option<DbId>,
    pub display_name: String,
    pub role: String,
    pub rfid_tag: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Person {
    /// Typed role, or `None` for a row with an unrecognized role value.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}
