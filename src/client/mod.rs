//! Session-affine JSON-RPC client for the MCP endpoint.
//!
//! Tracks the `Mcp-Session-Id` response header across calls so the server
//! keeps routing this client to the same session, and unwraps tool payloads
//! out of the MCP content envelope.

pub mod sync;

use serde_json::{Value, json};

use crate::gateway::models::User;
use crate::mcp::SESSION_HEADER;

/// Errors surfaced to the caller of an RPC operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("rpc transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc call failed: {status}")]
    Http { status: u16 },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client for the tool-calling endpoint.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: Option<String>,
    auth_token: Option<String>,
    current_user: Option<User>,
    next_id: u64,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            session_id: None,
            auth_token: None,
            current_user: None,
            next_id: 0,
        }
    }

    /// Issue a tools/call request and return the decoded tool payload.
    ///
    /// RPC error envelopes become `ClientError::Rpc`; business failures
    /// (`success: false` payloads) come back as ordinary values for the
    /// caller to interpret.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> ClientResult<Value> {
        self.next_id += 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments},
        });

        let mut req = self
            .http
            .post(&self.endpoint)
            .header("MCP-Protocol-Version", "2025-03-26")
            .json(&body);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        if let Some(sid) = &self.session_id {
            req = req.header(SESSION_HEADER, sid);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Http {
                status: resp.status().as_u16(),
            });
        }

        // Adopt the session id the server minted or confirmed.
        if let Some(sid) = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(sid.to_string());
        }

        let envelope: Value = resp.json().await?;
        if let Some(error) = envelope.get("error") {
            return Err(ClientError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"].as_str().unwrap_or("Unknown error").to_string(),
            });
        }

        let text = envelope["result"]["content"][0]["text"]
            .as_str()
            .ok_or_else(|| ClientError::Malformed("missing content text".to_string()))?;
        serde_json::from_str(text)
            .map_err(|e| ClientError::Malformed(format!("payload is not JSON: {e}")))
    }

    /// Log in and remember the auth state on success. A rejected login is
    /// returned as the payload, not an error.
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<Value> {
        let payload = self
            .call_tool("login", json!({"username": username, "password": password}))
            .await?;
        if payload["success"] == json!(true) {
            self.auth_token = payload["token"].as_str().map(str::to_owned);
            self.current_user = serde_json::from_value(payload["user"].clone()).ok();
        }
        Ok(payload)
    }

    /// Log out. The session id is kept so the server-side cart cache stays
    /// reachable until its TTL expires.
    pub async fn logout(&mut self) -> ClientResult<Value> {
        let payload = self.call_tool("logout", json!({})).await;
        self.auth_token = None;
        self.current_user = None;
        payload
    }

    pub async fn get_users(&mut self) -> ClientResult<Value> {
        self.call_tool("get_users", json!({})).await
    }

    pub async fn get_products(
        &mut self,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> ClientResult<Value> {
        let mut args = json!({});
        if let Some(cat) = category {
            args["category"] = json!(cat);
        }
        if let Some(n) = limit {
            args["limit"] = json!(n);
        }
        self.call_tool("get_products", args).await
    }

    pub async fn get_product(&mut self, product_id: u64) -> ClientResult<Value> {
        self.call_tool("get_product", json!({"productId": product_id}))
            .await
    }

    pub async fn get_categories(&mut self) -> ClientResult<Value> {
        self.call_tool("get_categories", json!({})).await
    }

    pub async fn add_to_cart(&mut self, product_id: u64, quantity: u32) -> ClientResult<Value> {
        self.call_tool(
            "add_to_cart",
            json!({"productId": product_id, "quantity": quantity}),
        )
        .await
    }

    pub async fn remove_from_cart(&mut self, product_id: u64) -> ClientResult<Value> {
        self.call_tool("remove_from_cart", json!({"productId": product_id}))
            .await
    }

    pub async fn get_cart(&mut self) -> ClientResult<Value> {
        self.call_tool("get_cart", json!({})).await
    }

    pub async fn clear_cart(&mut self) -> ClientResult<Value> {
        self.call_tool("clear_cart", json!({})).await
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some() && self.current_user.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}
