//! /status and /v1/directory/identity handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

/// Version advertised to peers and operators.
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── /v1/directory/identity ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub address: String,
    pub software_version: String,
}

pub async fn handle_identity(State(state): State<ApiState>) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        address: state.directory.identity().address().to_hex(),
        software_version: SOFTWARE_VERSION.to_string(),
    })
}

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub address: String,
    pub software_version: String,
    pub uptime_secs: u64,
    pub registry: RegistryInfo,
    pub throttle: ThrottleInfo,
    pub forks: Vec<ForkInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    /// Includes expired entries not yet swept.
    pub entries: usize,
    pub max_entries: usize,
    pub entry_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleInfo {
    pub max_requests_per_ip_per_minute: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkInfo {
    pub name: String,
    pub activation_height: u64,
    pub required_version: Option<String>,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let directory = &state.directory;
    let registry = directory.registry();

    let forks = directory
        .forks()
        .rules()
        .iter()
        .map(|r| ForkInfo {
            name: r.fork.name().to_string(),
            activation_height: r.activation_height,
            required_version: r.required_version.as_ref().map(|v| v.to_string()),
        })
        .collect();

    Json(StatusResponse {
        address: directory.identity().address().to_hex(),
        software_version: SOFTWARE_VERSION.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        registry: RegistryInfo {
            entries: registry.len(),
            max_entries: registry.capacity(),
            entry_ttl_secs: registry.ttl_secs(),
            sweep_interval_secs: state.config.registry.sweep_interval_secs,
        },
        throttle: ThrottleInfo {
            max_requests_per_ip_per_minute: state.config.throttle.max_requests_per_ip_per_minute,
        },
        forks,
    })
}
