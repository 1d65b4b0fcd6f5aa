use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::DeviceManager;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that sends periodic Ping frames to all
/// connected devices.
///
/// The task runs until the provided `DeviceManager` is dropped (which
/// happens during shutdown). The returned `JoinHandle` can be used to
/// abort the task explicitly if needed.
pub fn start_heartbeat(device_manager: Arc<DeviceManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = device_manager.connection_count().await;
            tracing::debug!(count, "Device heartbeat ping");
            device_manager.ping_all().await;
        }
    })
}
