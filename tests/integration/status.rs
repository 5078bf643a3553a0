use crate::*;

#[tokio::test]
async fn test_identity_endpoint() -> Result<()> {
    let dir = start_directory(0).await?;

    let body: serde_json::Value = get(&dir, "/v1/directory/identity").await?.json().await?;
    assert_eq!(body["address"], dir.address.to_hex());
    assert!(body["softwareVersion"].is_string(), "missing softwareVersion");
    Ok(())
}

#[tokio::test]
async fn test_status_shape() -> Result<()> {
    let dir = start_directory(0).await?;
    post_ping(&dir, &signed_ping(&Keypair::generate(), Network::Main, "0.0.1")).await?;

    let status: serde_json::Value = get(&dir, "/status").await?.json().await?;
    assert_eq!(status["address"], dir.address.to_hex());
    assert_eq!(status["registry"]["entries"], 1);
    assert_eq!(status["registry"]["maxEntries"], 100_000);
    assert_eq!(status["registry"]["entryTtlSecs"], 180);
    assert!(status["uptimeSecs"].is_number(), "missing uptimeSecs");
    assert_eq!(status["forks"][0]["name"], "GENESIS");
    assert_eq!(status["forks"][0]["requiredVersion"], "0.0.1");
    Ok(())
}
