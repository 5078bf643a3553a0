//! waypointd — peer directory daemon.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use waypoint_api::{ApiState, IpThrottle};
use waypoint_core::config::DirectoryConfig;
use waypoint_core::fork::ForkSchedule;
use waypoint_core::identity::DirectoryIdentity;
use waypoint_services::{DirectoryService, NodeRegistry};

mod expiry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = DirectoryConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = Arc::new(DirectoryConfig::load().context("failed to load config")?);
    tracing::info!(path = %DirectoryConfig::file_path().display(), "waypointd starting");

    // Identity
    let identity = DirectoryIdentity::load(Some(&config.identity.identity_file))
        .context("failed to load directory identity")?;
    let identity = Arc::new(identity);

    // Fork rules
    let forks = Arc::new(ForkSchedule::compiled());
    for rule in forks.rules() {
        tracing::info!(
            fork = rule.fork.name(),
            height = rule.activation_height,
            required_version = ?rule.required_version.as_ref().map(|v| v.to_string()),
            "fork rule"
        );
    }

    // Registry
    let registry = NodeRegistry::new(config.registry.entry_ttl_secs, config.registry.max_entries);
    tracing::info!(
        ttl_secs = config.registry.entry_ttl_secs,
        max_entries = config.registry.max_entries,
        "node registry initialized"
    );

    let directory = DirectoryService::new(identity, forks, registry.clone());
    let throttle = IpThrottle::from_config(&config.throttle);
    if !throttle.is_enabled() {
        tracing::warn!("per-IP throttling disabled");
    }

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let expiry_task = tokio::spawn(expiry::expiry_loop(
        registry.clone(),
        Duration::from_secs(config.registry.sweep_interval_secs),
    ));

    let mut api_task = {
        let state = ApiState::new(directory, config.clone());
        let mut api_shutdown = shutdown_tx.subscribe();
        let config = config.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = api_shutdown.recv().await;
            };
            if let Err(e) = waypoint_api::serve(
                state,
                throttle,
                &config.api.bind_addr,
                config.api.port,
                shutdown,
            )
            .await
            {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::info!("shutting down");
            // let in-flight requests finish
            if let Err(e) = (&mut api_task).await {
                tracing::error!(error = %e, "API task panicked");
            }
        }
        r = &mut api_task => tracing::error!("API task exited: {:?}", r),
        r = expiry_task   => tracing::error!("expiry task exited: {:?}", r),
    }

    tracing::info!(peers = registry.len(), "waypointd stopped");
    Ok(())
}
