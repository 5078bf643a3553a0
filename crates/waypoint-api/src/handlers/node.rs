//! /v1/node handlers — the ping/pong exchange and the signed peer listing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use waypoint_core::message::{Network, PingMessage, PongMessage};

use super::{ApiError, ApiState};

// ── /v1/node/ping (POST) ──────────────────────────────────────────────────────

pub async fn handle_ping(
    State(state): State<ApiState>,
    body: Result<Json<PingMessage>, JsonRejection>,
) -> Result<Json<PongMessage>, ApiError> {
    let Json(ping) = body.map_err(|e| {
        tracing::warn!(error = %e, "ping rejected: unreadable body");
        ApiError::bad_request("malformed", e.body_text())
    })?;

    let pong = state.directory.handle_ping(&ping)?;
    Ok(Json(pong))
}

// ── /v1/node/peers (GET) ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PeersQuery {
    pub network: Option<String>,
}

pub async fn handle_peers(
    State(state): State<ApiState>,
    Query(query): Query<PeersQuery>,
) -> Result<Json<PongMessage>, ApiError> {
    let network = match query.network.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<Network>()
                .map_err(|e| ApiError::bad_request("unknown_network", e))?,
        ),
    };
    Ok(Json(state.directory.build_pong(network)))
}
