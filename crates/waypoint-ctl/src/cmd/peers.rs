//! Signed peer listing.

use anyhow::{Result, bail};

use waypoint_core::{Network, PongMessage};

use super::http::{Endpoint, get_json};
use super::identity::fetch_address;

pub async fn cmd_peers(endpoint: &Endpoint, network: Option<Network>) -> Result<()> {
    let url = match network {
        Some(n) => endpoint.url(&format!("/v1/node/peers?network={}", n)),
        None => endpoint.url("/v1/node/peers"),
    };
    let pong: PongMessage = get_json(&url).await?;

    let directory = fetch_address(endpoint).await?;
    if !pong.is_authentic(&directory) {
        bail!("peer list is not signed by directory {}", directory);
    }

    print_pong(&pong);
    Ok(())
}

pub fn print_pong(pong: &PongMessage) {
    let entries = &pong.payload.entries;
    if entries.is_empty() {
        println!("No live peers.");
        return;
    }

    println!("═══════════════════════════════════════");
    println!("  Live Peers ({})", entries.len());
    println!("═══════════════════════════════════════");

    for p in entries {
        println!("  ┌─ {}", p.node_identity);
        println!("  │  listen     : {}:{}", p.p2p_listen_host, p.p2p_listen_port);
        println!("  │  network    : {}", p.network);
        println!("  │  version    : {}", p.software_version);
        println!("  │  head       : {} @ {}", p.head_hash, p.head_height);
        println!("  │  difficulty : {}", p.total_difficulty);
        println!("  └─ updated    : {}", p.updated_at);
    }
}
