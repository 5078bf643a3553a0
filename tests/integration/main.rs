//! Waypoint integration test harness.
//!
//! Each test boots a full directory in-process (identity, fork schedule,
//! registry, HTTP server with throttling) on an ephemeral loopback port and
//! talks to it over real HTTP.
//!
//!   cargo test --test integration
//!
//! Every directory gets its own identity file under the system temp dir,
//! removed when the handle is dropped.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::oneshot;

use waypoint_api::{ApiState, IpThrottle};
use waypoint_core::config::DirectoryConfig;
use waypoint_core::fork::ForkSchedule;
use waypoint_core::identity::DirectoryIdentity;
use waypoint_core::message::PingFields;
use waypoint_core::{crypto, Address, Keypair, Network, PingMessage};
use waypoint_services::{unix_now, DirectoryService, NodeRegistry};

mod exchange;
mod peers;
mod status;
mod throttle;

// ── Harness ───────────────────────────────────────────────────────────────────

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A running directory. Shuts the server down on drop.
pub struct Directory {
    pub addr: SocketAddr,
    pub address: Address,
    pub registry: NodeRegistry,
    dir: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Directory {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.addr, path)
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Boot a directory with the given per-IP request budget (0 = unlimited).
pub async fn start_directory(max_requests_per_minute: u32) -> Result<Directory> {
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "waypoint-integration-{}-{}",
        std::process::id(),
        id
    ));
    let _ = std::fs::remove_dir_all(&dir);

    let mut config = DirectoryConfig::default();
    config.identity.identity_file = dir.join("identity");
    config.throttle.max_requests_per_ip_per_minute = max_requests_per_minute;
    let config = Arc::new(config);

    let identity = Arc::new(
        DirectoryIdentity::load(Some(&config.identity.identity_file))
            .context("identity bootstrap failed")?,
    );
    let address = identity.address();
    let registry = NodeRegistry::new(config.registry.entry_ttl_secs, config.registry.max_entries);
    let directory = DirectoryService::new(
        identity,
        Arc::new(ForkSchedule::compiled()),
        registry.clone(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();

    let state = ApiState::new(directory, config.clone());
    let throttle = IpThrottle::from_config(&config.throttle);
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = waypoint_api::serve_on(listener, state, throttle, shutdown).await {
            eprintln!("directory server failed: {e}");
        }
    });

    Ok(Directory {
        addr,
        address,
        registry,
        dir,
        shutdown: Some(tx),
    })
}

/// A correctly hashed and signed ping from `peer`, stamped now.
pub fn signed_ping(peer: &Keypair, network: Network, version: &str) -> PingMessage {
    PingFields {
        identity: peer.address(),
        listen_host: "203.0.113.7".into(),
        listen_port: 30303,
        network,
        software_version: version.into(),
        total_difficulty: primitive_types::U256::from_dec_str("340282366920938463463374607431768211456")
            .expect("valid decimal"),
        head_hash: crypto::hash(b"integration head"),
        head_height: 4_096,
        timestamp: unix_now(),
    }
    .into_signed(peer)
}

pub async fn post_ping(dir: &Directory, ping: &PingMessage) -> Result<reqwest::Response> {
    reqwest::Client::new()
        .post(dir.url("/v1/node/ping"))
        .json(ping)
        .send()
        .await
        .context("POST /v1/node/ping failed")
}

pub async fn get(dir: &Directory, path: &str) -> Result<reqwest::Response> {
    reqwest::get(dir.url(path))
        .await
        .with_context(|| format!("GET {path} failed"))
}
