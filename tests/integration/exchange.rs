use crate::*;

use waypoint_core::PongMessage;

#[tokio::test]
async fn test_two_peers_see_each_other() -> Result<()> {
    let dir = start_directory(0).await?;
    let peer_a = Keypair::generate();
    let peer_b = Keypair::generate();

    let resp = post_ping(&dir, &signed_ping(&peer_a, Network::Main, "0.0.1")).await?;
    assert_eq!(resp.status(), 200);
    let pong: PongMessage = resp.json().await?;
    assert!(pong.is_authentic(&dir.address), "pong not signed by directory");
    assert_eq!(pong.payload.entries.len(), 1);
    assert_eq!(pong.payload.entries[0].node_identity, peer_a.address().to_hex());

    let resp = post_ping(&dir, &signed_ping(&peer_b, Network::Main, "0.1.0")).await?;
    assert_eq!(resp.status(), 200);
    let pong: PongMessage = resp.json().await?;
    assert!(pong.is_authentic(&dir.address));

    let mut ids: Vec<String> = pong
        .payload
        .entries
        .iter()
        .map(|e| e.node_identity.clone())
        .collect();
    ids.sort();
    let mut expected = vec![peer_a.address().to_hex(), peer_b.address().to_hex()];
    expected.sort();
    assert_eq!(ids, expected);

    // big difficulties survive as decimal text
    assert!(pong
        .payload
        .entries
        .iter()
        .all(|e| e.total_difficulty == "340282366920938463463374607431768211456"));
    Ok(())
}

#[tokio::test]
async fn test_repeat_ping_keeps_single_entry() -> Result<()> {
    let dir = start_directory(0).await?;
    let peer = Keypair::generate();

    for _ in 0..3 {
        let resp = post_ping(&dir, &signed_ping(&peer, Network::Main, "0.0.1")).await?;
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(dir.registry.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_tampered_ping_is_unauthorized() -> Result<()> {
    let dir = start_directory(0).await?;
    let peer = Keypair::generate();
    let mut ping = signed_ping(&peer, Network::Main, "0.0.1");
    ping.p2p_listen_host = "198.51.100.66".into();

    let resp = post_ping(&dir, &ping).await?;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["kind"], "authentication");
    assert_eq!(body["code"], "hash_mismatch");
    assert!(dir.registry.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_forged_signature_is_unauthorized() -> Result<()> {
    let dir = start_directory(0).await?;
    let victim = Keypair::generate();
    let forger = Keypair::generate();

    let mut ping = signed_ping(&forger, Network::Main, "0.0.1");
    // claim someone else's identity, re-hash, keep the forger's signature
    ping.node_identity = victim.address().to_hex();
    let fields = ping.decode().map_err(anyhow::Error::msg)?.fields;
    ping.hash = fields.canonical_hash().to_hex();

    let resp = post_ping(&dir, &ping).await?;
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "bad_signature");
    assert!(dir.registry.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_old_software_needs_upgrade() -> Result<()> {
    let dir = start_directory(0).await?;
    let peer = Keypair::generate();

    let resp = post_ping(&dir, &signed_ping(&peer, Network::Main, "0.0.0")).await?;
    assert_eq!(resp.status(), 426);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "version_rejected");

    let resp = post_ping(&dir, &signed_ping(&peer, Network::Main, "not-a-version")).await?;
    assert_eq!(resp.status(), 426);

    assert!(dir.registry.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stale_ping_is_bad_request() -> Result<()> {
    let dir = start_directory(0).await?;
    let peer = Keypair::generate();

    let fields = signed_ping(&peer, Network::Main, "0.0.1")
        .decode()
        .map_err(anyhow::Error::msg)?
        .fields;
    let stale = PingFields {
        timestamp: fields.timestamp - 600,
        ..fields
    }
    .into_signed(&peer);

    let resp = post_ping(&dir, &stale).await?;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["code"], "timestamp_skew");
    Ok(())
}

#[tokio::test]
async fn test_garbage_body_is_bad_request() -> Result<()> {
    let dir = start_directory(0).await?;

    let resp = reqwest::Client::new()
        .post(dir.url("/v1/node/ping"))
        .header("content-type", "application/json")
        .body("{\"nodeIdentity\": 7}")
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "malformed");

    let peer = Keypair::generate();
    let mut ping = signed_ping(&peer, Network::Main, "0.0.1");
    ping.head_hash = "0xnothex".into();
    let resp = post_ping(&dir, &ping).await?;
    assert_eq!(resp.status(), 400);
    Ok(())
}
