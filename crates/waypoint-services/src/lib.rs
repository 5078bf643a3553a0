//! waypoint-services — the peer registry and the ping/pong protocol handler.

pub mod directory;
pub mod registry;

pub use directory::DirectoryService;
pub use registry::{NodeRecord, NodeRegistry};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
