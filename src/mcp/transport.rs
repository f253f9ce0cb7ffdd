use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::handlers;
use super::jsonrpc::{JsonRpcRequest, PARSE_ERROR};
use super::session::SessionStore;
use crate::gateway::Gateway;

/// Header carrying session affinity between client and server.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Shared state for the MCP server.
#[derive(Clone)]
pub struct McpState {
    pub gateway: Arc<Gateway>,
    pub sessions: SessionStore,
}

/// Handle POST /mcp — receive JSON-RPC messages from the client.
///
/// The session id comes from the request header; an absent or unknown id
/// lazily creates a session, and the id (possibly newly minted) is echoed
/// back on every response to establish affinity for subsequent calls.
pub async fn handle_post(State(state): State<McpState>, request: Request<Body>) -> Response {
    let session_id = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(SessionStore::generate_id);

    let (session, is_new) = state.sessions.get_or_create(&session_id);
    if is_new {
        tracing::debug!(session_id = %session_id, "created session");
    }

    let body = match axum::body::to_bytes(request.into_body(), 1024 * 1024).await {
        Ok(b) => b,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "Request body too large").into_response();
        }
    };

    let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            let error = serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": PARSE_ERROR, "message": format!("Parse error: {e}")}
            });
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header(SESSION_HEADER, &session_id)
                .body(Body::from(serde_json::to_vec(&error).unwrap()))
                .unwrap();
        }
    };

    // Handle notifications (no id) — process, then return 202 Accepted
    if rpc_request.id.is_none() {
        handlers::handle_request(&state.gateway, &session, &rpc_request).await;
        return Response::builder()
            .status(StatusCode::ACCEPTED)
            .header(SESSION_HEADER, &session_id)
            .body(Body::empty())
            .unwrap();
    }

    let response = handlers::handle_request(&state.gateway, &session, &rpc_request).await;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(SESSION_HEADER, &session_id)
        .body(Body::from(serde_json::to_vec(&response).unwrap()))
        .unwrap()
}

/// Handle GET /mcp — not part of this transport. Fixed rejection, no
/// session lookup.
pub async fn handle_get() -> Response {
    let body = serde_json::json!({"success": false, "error": "GET not implemented"});
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_vec(&body).unwrap(),
    )
        .into_response()
}
