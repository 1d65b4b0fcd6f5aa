//! Read-only repository for the `users` directory table.
//!
//! The directory is owned by the external identity system. Lookups are
//! pure reads, safe to call concurrently and repeatedly; a miss is a
//! normal outcome, not a fault.

use rollcall_core::types::DbId;
use sqlx::PgPool;

use crate::models::person::Person;

const COLUMNS: &str = "id, organization_id, department_id, display_name, role, rfid_tag, \
                        created_at, updated_at";

/// Directory lookups by tag and by id.
pub struct PersonRepo;

impl PersonRepo {
    /// Resolve an RFID tag within an organization.
    pub async fn find_by_tag(
        pool: &PgPool,
        organization_id: DbId,
        rfid_tag: &str,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE organization_id = $1 AND rfid_tag = $2"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(organization_id)
            .bind(rfid_tag)
            .fetch_optional(pool)
            .await
    }

    /// Find a person by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
