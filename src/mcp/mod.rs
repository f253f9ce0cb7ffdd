mod cart;
mod handlers;
mod jsonrpc;
pub mod session;
mod tools;
mod transport;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::gateway::Gateway;
use session::SessionStore;
use transport::McpState;

pub use transport::SESSION_HEADER;

/// Build the MCP router around a gateway client and a session store. The
/// store is injected so tests can run isolated stores per case.
pub fn router(gateway: Arc<Gateway>, sessions: SessionStore) -> Router {
    let state = McpState { gateway, sessions };

    Router::new()
        .route("/mcp", post(transport::handle_post))
        .route("/mcp", get(transport::handle_get))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
