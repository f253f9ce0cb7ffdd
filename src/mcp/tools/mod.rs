pub mod auth;
pub mod cart;
pub mod catalog;

use serde_json::Value;

use crate::gateway::Gateway;
use crate::mcp::session::SharedSession;

/// A tool definition for the tools/list response.
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// All registered tool definitions.
pub fn all_tools() -> Vec<ToolDef> {
    let mut tools = Vec::new();
    tools.extend(auth::tool_defs());
    tools.extend(catalog::tool_defs());
    tools.extend(cart::tool_defs());
    tools
}

/// Dispatch a tools/call request to the appropriate handler.
///
/// The session lock is held for the whole call, so two requests bearing the
/// same session id serialize their cache read-modify-write sequences.
pub async fn dispatch(
    gateway: &Gateway,
    session: &SharedSession,
    tool_name: &str,
    arguments: &Value,
) -> Result<Value, String> {
    let mut session = session.lock().await;
    match tool_name {
        "login" => auth::login(gateway, &mut session, arguments).await,
        "logout" => auth::logout(&mut session),
        "get_users" => auth::get_users(gateway).await,
        "get_products" => catalog::get_products(gateway, arguments).await,
        "get_product" => catalog::get_product(gateway, arguments).await,
        "get_categories" => catalog::get_categories(gateway).await,
        "add_to_cart" => cart::add_to_cart(gateway, &mut session, arguments).await,
        "remove_from_cart" => cart::remove_from_cart(gateway, &mut session, arguments).await,
        "get_cart" => cart::get_cart(gateway, &mut session).await,
        "clear_cart" => cart::clear_cart(gateway, &mut session).await,
        _ => Err(format!("Unknown tool: {tool_name}")),
    }
}
