use serde_json::{Value, json};

use super::ToolDef;
use crate::gateway::Gateway;
use crate::mcp::session::Session;

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "login",
            description: "Authenticate against the store and start a user session",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string"},
                    "password": {"type": "string"}
                },
                "required": ["username", "password"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "logout",
            description: "Log out the current user",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "get_users",
            description: "Get all users",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
}

/// Authenticate against the gateway. Rejected credentials are a business
/// outcome, not a protocol error: the payload carries `success: false` and
/// the call itself succeeds.
pub async fn login(
    gateway: &Gateway,
    session: &mut Session,
    args: &Value,
) -> Result<Value, String> {
    let username = args["username"].as_str().ok_or("Missing username")?;
    let password = args["password"].as_str().ok_or("Missing password")?;

    let token = match gateway
        .login(username, password)
        .await
        .map_err(|e| e.to_string())?
    {
        Some(token) => token,
        None => {
            return Ok(json!({"success": false, "error": "Invalid credentials"}));
        }
    };

    // The auth endpoint only returns a token; resolve the user record by
    // scanning the full user list. First username match wins; no match
    // leaves the session without a user while keeping the token.
    let users = gateway.users().await.map_err(|e| e.to_string())?;
    let user = users.into_iter().find(|u| u.username == username);

    session.auth_token = Some(token.clone());
    session.current_user = user.clone();
    tracing::debug!(username, resolved = user.is_some(), "login succeeded");

    Ok(json!({"success": true, "token": token, "user": user}))
}

/// Clear authentication only. The cart cache stays in place so a re-login
/// within the TTL window sees a continuous cart.
pub fn logout(session: &mut Session) -> Result<Value, String> {
    session.auth_token = None;
    session.current_user = None;
    Ok(json!({"success": true}))
}

pub async fn get_users(gateway: &Gateway) -> Result<Value, String> {
    let users = gateway.users().await.map_err(|e| e.to_string())?;
    Ok(json!({"success": true, "users": users}))
}
