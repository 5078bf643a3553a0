//! Daemon status.

use anyhow::Result;
use serde::Deserialize;

use super::http::{Endpoint, get_json};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    address: String,
    software_version: String,
    uptime_secs: u64,
    registry: RegistryInfo,
    throttle: ThrottleInfo,
    forks: Vec<ForkInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryInfo {
    entries: usize,
    max_entries: usize,
    entry_ttl_secs: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThrottleInfo {
    max_requests_per_ip_per_minute: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForkInfo {
    name: String,
    activation_height: u64,
    required_version: Option<String>,
}

pub async fn cmd_status(endpoint: &Endpoint) -> Result<()> {
    let resp: StatusResponse = get_json(&endpoint.url("/status")).await?;

    println!("═══════════════════════════════════════");
    println!("  Waypoint Directory Status");
    println!("═══════════════════════════════════════");
    println!("  Address      : {}", resp.address);
    println!("  Version      : {}", resp.software_version);
    println!("  Uptime       : {}s", resp.uptime_secs);
    println!(
        "  Registry     : {} / {} (ttl {}s)",
        resp.registry.entries, resp.registry.max_entries, resp.registry.entry_ttl_secs
    );
    match resp.throttle.max_requests_per_ip_per_minute {
        0 => println!("  Throttle     : off"),
        n => println!("  Throttle     : {} req/min per IP", n),
    }

    println!("\n  Forks:");
    for f in &resp.forks {
        println!(
            "    {:<10} height {:<10} min version {}",
            f.name,
            f.activation_height,
            f.required_version.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
