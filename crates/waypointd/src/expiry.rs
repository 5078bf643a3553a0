//! Background sweep that drops registry entries past their TTL.
//!
//! Reads already hide expired entries; this only reclaims their memory.

use std::time::Duration;

use waypoint_services::{unix_now, NodeRegistry};

pub async fn expiry_loop(registry: NodeRegistry, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        sweep(&registry, unix_now());
    }
}

fn sweep(registry: &NodeRegistry, now: u64) -> usize {
    let removed = registry.purge_expired(now);
    if removed > 0 {
        tracing::debug!(removed, remaining = registry.len(), "expired peer registry entries");
    }
    removed
}
