use std::time::Duration;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// A socket silent for this long is treated as vanished.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(90);
