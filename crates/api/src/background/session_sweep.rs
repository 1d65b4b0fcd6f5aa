//! Time-driven session closure.
//!
//! Sessions must close when their slot is over even if no further scan
//! ever arrives, so a sweep task walks all open sessions on a fixed
//! interval and closes the expired ones. The first tick fires
//! immediately, which doubles as the restart reconciliation pass: open
//! sessions found in the store are re-judged against their slot and the
//! current time, never assumed closed.
//!
//! The sweep takes the same per-occurrence lock as the scan path before
//! transitioning, so it cannot race a late-arriving scan.

use std::collections::HashMap;
use std::sync::Arc;

use rollcall_core::policy::PolicySettings;
use rollcall_core::types::{DbId, Timestamp};
use rollcall_db::repositories::{PolicyRepo, SessionRepo};
use rollcall_db::DbPool;
use rollcall_events::{DomainEvent, EventBus};
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::engine::locks::{SessionKey, SessionLockMap};

/// Run the session sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    locks: Arc<SessionLockMap>,
    event_bus: Arc<EventBus>,
    config: Arc<ServerConfig>,
    cancel: CancellationToken,
) {
    let interval_secs = config.sweep_interval_secs;
    tracing::info!(interval_secs, "Session sweep started");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&pool, &locks, &event_bus, &config, chrono::Utc::now()).await {
                    Ok(closed) => {
                        if closed > 0 {
                            tracing::info!(closed, "Session sweep closed expired sessions");
                        } else {
                            tracing::debug!("Session sweep: nothing to close");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session sweep cycle failed");
                    }
                }
                let purged = locks.purge_idle().await;
                if purged > 0 {
                    tracing::debug!(purged, "Purged idle occurrence locks");
                }
            }
        }
    }
}

/// One sweep cycle: close every open session whose slot ended more than
/// `break_warning_mins` ago on the schedule wall clock.
///
/// Exposed separately (with an injected `now`) so tests can drive cycles
/// deterministically.
pub async fn sweep_once(
    pool: &DbPool,
    locks: &SessionLockMap,
    event_bus: &EventBus,
    config: &ServerConfig,
    now: Timestamp,
) -> Result<u64, sqlx::Error> {
    let open = SessionRepo::list_open(pool).await?;
    if open.is_empty() {
        return Ok(0);
    }

    let wall = config.to_wall(now);
    let mut policies: HashMap<DbId, PolicySettings> = HashMap::new();
    let mut closed = 0;

    for row in open {
        let policy = match policies.get(&row.organization_id) {
            Some(policy) => policy.clone(),
            None => {
                let policy = PolicyRepo::get(pool, row.organization_id).await?;
                policies.insert(row.organization_id, policy.clone());
                policy
            }
        };

        let deadline = row.day.and_time(row.end_time)
            + chrono::Duration::minutes(policy.break_warning_mins as i64);
        if wall <= deadline {
            continue;
        }

        let key = SessionKey {
            organization_id: row.organization_id,
            room: row.room.clone(),
            slot_id: row.slot_id,
            day: row.day,
        };
        let lock = locks.lock_for(&key).await;
        let _guard = lock.lock().await;

        // Re-check under the lock: a scan cannot have reopened the
        // session (closure is terminal), but it may have closed already
        // via the admin surface.
        if SessionRepo::close(pool, row.id, now).await? {
            closed += 1;
            tracing::info!(session_id = row.id, room = %row.room, "Session auto-closed");
            event_bus.publish(
                DomainEvent::new("session.auto_closed")
                    .with_room(row.room.as_str())
                    .with_session(row.id),
            );
        }
    }

    Ok(closed)
}
