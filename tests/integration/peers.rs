use crate::*;

use waypoint_core::PongMessage;

#[tokio::test]
async fn test_pong_lists_only_requesters_network() -> Result<()> {
    let dir = start_directory(0).await?;
    let main_peer = Keypair::generate();
    let test_peer = Keypair::generate();

    post_ping(&dir, &signed_ping(&test_peer, Network::Test, "0.0.1")).await?;
    let pong: PongMessage = post_ping(&dir, &signed_ping(&main_peer, Network::Main, "0.0.1"))
        .await?
        .json()
        .await?;

    assert_eq!(pong.payload.entries.len(), 1);
    assert_eq!(pong.payload.entries[0].network, Network::Main);
    Ok(())
}

#[tokio::test]
async fn test_peer_listing_is_signed_and_filterable() -> Result<()> {
    let dir = start_directory(0).await?;
    post_ping(&dir, &signed_ping(&Keypair::generate(), Network::Main, "0.0.1")).await?;
    post_ping(&dir, &signed_ping(&Keypair::generate(), Network::Test, "0.0.1")).await?;

    let all: PongMessage = get(&dir, "/v1/node/peers").await?.json().await?;
    assert!(all.is_authentic(&dir.address));
    assert_eq!(all.payload.entries.len(), 2);

    let test: PongMessage = get(&dir, "/v1/node/peers?network=TEST").await?.json().await?;
    assert!(test.is_authentic(&dir.address));
    assert_eq!(test.payload.entries.len(), 1);
    assert_eq!(test.payload.entries[0].network, Network::Test);

    let resp = get(&dir, "/v1/node/peers?network=MOON").await?;
    assert_eq!(resp.status(), 400);
    Ok(())
}

#[tokio::test]
async fn test_listing_from_other_directory_fails_verification() -> Result<()> {
    let dir_a = start_directory(0).await?;
    let dir_b = start_directory(0).await?;
    assert_ne!(dir_a.address, dir_b.address);

    let pong: PongMessage = get(&dir_a, "/v1/node/peers").await?.json().await?;
    assert!(pong.is_authentic(&dir_a.address));
    assert!(!pong.is_authentic(&dir_b.address));
    Ok(())
}
