use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::ServerConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::TokenIssuer;
use crate::routes::{self, ServerState};
use crate::store::MemoryStore;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Fresh in-memory state signing tokens with the configured secret and lifetime.
pub fn build_state(cfg: &ServerConfig) -> ServerState {
    ServerState {
        store: Arc::new(MemoryStore::new()),
        tokens: TokenIssuer::new(cfg.jwt_secret.clone(), cfg.token_ttl_hours),
    }
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

fn bind_addr(cfg: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(state);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Public entry: bind the configured address and run until `shutdown` resolves.
pub async fn run<F>(cfg: &ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = bind_addr(cfg)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "starting task backend");
    serve(listener, build_state(cfg), shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_from_config() -> anyhow::Result<()> {
        let cfg = ServerConfig { host: "0.0.0.0".into(), port: 9000, jwt_secret: "s".into(), token_ttl_hours: 1 };
        assert_eq!(bind_addr(&cfg)?, "0.0.0.0:9000".parse::<SocketAddr>()?);
        Ok(())
    }

    #[test]
    fn rejects_unparseable_host() {
        let cfg = ServerConfig { host: "not a host".into(), port: 9000, jwt_secret: "s".into(), token_ttl_hours: 1 };
        assert!(bind_addr(&cfg).is_err());
    }
}
