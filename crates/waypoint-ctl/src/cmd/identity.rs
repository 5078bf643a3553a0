//! Directory identity lookup.

use anyhow::{Context, Result};
use serde::Deserialize;

use waypoint_core::Address;

use super::http::{Endpoint, get_json};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub address: String,
    pub software_version: String,
}

/// Fetch and parse the directory's signing address.
pub async fn fetch_address(endpoint: &Endpoint) -> Result<Address> {
    let resp: IdentityResponse = get_json(&endpoint.url("/v1/directory/identity")).await?;
    resp.address
        .parse()
        .with_context(|| format!("directory returned an invalid address {:?}", resp.address))
}

pub async fn cmd_identity(endpoint: &Endpoint) -> Result<()> {
    let resp: IdentityResponse = get_json(&endpoint.url("/v1/directory/identity")).await?;

    println!("═══════════════════════════════════════");
    println!("  Directory Identity");
    println!("═══════════════════════════════════════");
    println!("  Address  : {}", resp.address);
    println!("  Version  : {}", resp.software_version);

    Ok(())
}
