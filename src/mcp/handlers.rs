use serde_json::{Value, json};

use super::jsonrpc::{JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse};
use super::session::SharedSession;
use super::tools;
use crate::gateway::Gateway;

/// Handle a JSON-RPC request against the current session. Returns the
/// response value to serialize.
pub async fn handle_request(
    gateway: &Gateway,
    session: &SharedSession,
    request: &JsonRpcRequest,
) -> Value {
    match request.method.as_str() {
        "initialize" => handle_initialize(request),
        "notifications/initialized" => {
            // Notification — no response needed
            Value::Null
        }
        "tools/list" => handle_tools_list(request),
        "tools/call" => handle_tools_call(gateway, session, request).await,
        "ping" => {
            serde_json::to_value(JsonRpcResponse::success(request.id.clone(), json!({}))).unwrap()
        }
        _ => serde_json::to_value(JsonRpcErrorResponse::method_not_found(request.id.clone()))
            .unwrap(),
    }
}

fn handle_initialize(request: &JsonRpcRequest) -> Value {
    let result = json!({
        "protocolVersion": "2025-03-26",
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": "fakestore-mcp-server",
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": "This MCP server exposes a storefront: log in with login, browse with get_products / get_product / get_categories, and manage the cart with add_to_cart, remove_from_cart, get_cart, and clear_cart."
    });

    serde_json::to_value(JsonRpcResponse::success(request.id.clone(), result)).unwrap()
}

/// Handle tools/list — return all tool definitions.
fn handle_tools_list(request: &JsonRpcRequest) -> Value {
    let tool_defs = tools::all_tools();
    let tools_json: Vec<Value> = tool_defs
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema,
            })
        })
        .collect();

    serde_json::to_value(JsonRpcResponse::success(
        request.id.clone(),
        json!({ "tools": tools_json }),
    ))
    .unwrap()
}

/// Handle tools/call — dispatch to the tool handler. Handler failures are
/// caught here and surfaced as -32603 error envelopes carrying the message.
async fn handle_tools_call(
    gateway: &Gateway,
    session: &SharedSession,
    request: &JsonRpcRequest,
) -> Value {
    let tool_name = match request.params.get("name").and_then(|v| v.as_str()) {
        Some(name) => name,
        None => {
            return serde_json::to_value(JsonRpcErrorResponse::invalid_params(
                request.id.clone(),
                "Missing 'name' in params",
            ))
            .unwrap();
        }
    };

    let arguments = request
        .params
        .get("arguments")
        .cloned()
        .unwrap_or(json!({}));

    match tools::dispatch(gateway, session, tool_name, &arguments).await {
        Ok(result) => {
            let content = json!({
                "content": [{
                    "type": "text",
                    "text": serde_json::to_string(&result).unwrap_or_default()
                }],
                "structuredContent": result,
            });
            serde_json::to_value(JsonRpcResponse::success(request.id.clone(), content)).unwrap()
        }
        Err(err) => {
            tracing::error!(tool = tool_name, error = %err, "tool call failed");
            let message = if err.is_empty() {
                "Internal error".to_string()
            } else {
                err
            };
            serde_json::to_value(JsonRpcErrorResponse::internal_error(
                request.id.clone(),
                message,
            ))
            .unwrap()
        }
    }
}
