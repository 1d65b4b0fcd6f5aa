//! Repository for the `devices` table.

use rollcall_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::device::{CreateDevice, Device};

const COLUMNS: &str = "id, organization_id, room, label, key_hash, is_active, last_seen_at, \
                        created_at, updated_at";

/// Device registration and gateway authentication lookups.
pub struct DeviceRepo;

impl DeviceRepo {
    /// Register a new device. The caller generates the key and passes
    /// only its digest here.
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateDevice,
        key_hash: &str,
    ) -> Result<Device, sqlx::Error> {
        let query = format!(
            "INSERT INTO devices (organization_id, room, label, key_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(organization_id)
            .bind(&input.room)
            .bind(&input.label)
            .bind(key_hash)
            .fetch_one(pool)
            .await
    }

    /// Authenticate: find the active device holding this key digest.
    pub async fn find_by_key_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices
             WHERE key_hash = $1 AND is_active = true"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(key_hash)
            .fetch_optional(pool)
            .await
    }

    /// List an organization's devices.
    pub async fn list(pool: &PgPool, organization_id: DbId) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices
             WHERE organization_id = $1
             ORDER BY room, label"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Deactivate a device. Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE devices SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp the device as seen (successful handshake or scan).
    pub async fn touch_last_seen(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE devices SET last_seen_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(pool)
            .await?;
        Ok(())
    }
}
