pub mod handlers;
pub mod throttle;

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::{ApiError, ApiState};
pub use throttle::IpThrottle;

/// Full application router: every route lives under `/api`, and the
/// per-IP throttle sits in front of all of them.
pub fn router(state: ApiState, limiter: IpThrottle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/v1/node/ping", post(handlers::handle_ping))
        .route("/v1/node/peers", get(handlers::handle_peers))
        .route("/v1/directory/identity", get(handlers::handle_identity))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            throttle::enforce,
        ))
        .layer(cors)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    state: ApiState,
    throttle: IpThrottle,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state, throttle);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

pub async fn serve(
    state: ApiState,
    throttle: IpThrottle,
    bind_addr: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
    tracing::info!(bind_addr, port, "API listening");
    serve_on(listener, state, throttle, shutdown).await
}
