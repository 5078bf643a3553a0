use crate::*;

#[tokio::test]
async fn test_requests_past_budget_get_429() -> Result<()> {
    let dir = start_directory(3).await?;

    for _ in 0..3 {
        let resp = get(&dir, "/v1/directory/identity").await?;
        assert_eq!(resp.status(), 200);
    }

    let resp = get(&dir, "/v1/directory/identity").await?;
    assert_eq!(resp.status(), 429);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["message"], "Too many requests");

    // pings share the same per-IP budget
    let resp = post_ping(&dir, &signed_ping(&Keypair::generate(), Network::Main, "0.0.1")).await?;
    assert_eq!(resp.status(), 429);
    assert!(dir.registry.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_zero_budget_means_unlimited() -> Result<()> {
    let dir = start_directory(0).await?;
    for _ in 0..50 {
        let resp = get(&dir, "/v1/directory/identity").await?;
        assert_eq!(resp.status(), 200);
    }
    Ok(())
}
