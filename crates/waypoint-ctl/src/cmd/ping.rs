//! Send a signed ping from a local peer key and check the pong.
//!
//! The peer key is a mnemonic key file in the same format as the directory's
//! identity; one is generated on first use.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use primitive_types::U256;

use waypoint_core::identity::load_or_create_keypair;
use waypoint_core::message::PingFields;
use waypoint_core::{Hash, Network, PingMessage, PongMessage};

use super::http::{Endpoint, post_json_body};
use super::identity::fetch_address;
use super::peers::print_pong;

pub const DEFAULT_PEER_KEY: &str = ".peer_identity";

#[derive(Debug, Clone)]
pub struct PingOptions {
    pub key_file: PathBuf,
    pub listen_host: String,
    pub listen_port: u16,
    pub network: Network,
    pub software_version: String,
    pub total_difficulty: U256,
    pub head_hash: Hash,
    pub head_height: u64,
}

impl PingOptions {
    pub fn new(listen_host: String, listen_port: u16) -> Self {
        Self {
            key_file: PathBuf::from(DEFAULT_PEER_KEY),
            listen_host,
            listen_port,
            network: Network::Main,
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            total_difficulty: U256::zero(),
            head_hash: Hash([0u8; 32]),
            head_height: 0,
        }
    }
}

pub fn build_ping(opts: &PingOptions, timestamp: u64) -> Result<PingMessage> {
    let peer = load_or_create_keypair(&opts.key_file)
        .with_context(|| format!("failed to load peer key {}", opts.key_file.display()))?;

    let fields = PingFields {
        identity: peer.address(),
        listen_host: opts.listen_host.clone(),
        listen_port: opts.listen_port,
        network: opts.network,
        software_version: opts.software_version.clone(),
        total_difficulty: opts.total_difficulty,
        head_hash: opts.head_hash,
        head_height: opts.head_height,
        timestamp,
    };
    Ok(fields.into_signed(&peer))
}

pub async fn cmd_ping(endpoint: &Endpoint, opts: &PingOptions) -> Result<()> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs();
    let ping = build_ping(opts, now)?;
    println!("Pinging as {}", ping.node_identity);

    let pong: PongMessage = post_json_body(&endpoint.url("/v1/node/ping"), &ping).await?;

    let directory = fetch_address(endpoint).await?;
    if !pong.is_authentic(&directory) {
        bail!("pong is not signed by directory {}", directory);
    }

    print_pong(&pong);
    Ok(())
}
