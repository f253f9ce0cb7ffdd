use serde_json::{Value, json};

use super::ToolDef;
use crate::gateway::Gateway;
use crate::mcp::cart;
use crate::mcp::session::Session;

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "add_to_cart",
            description: "Add an item to the logged-in user's cart",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "productId": {"type": "number"},
                    "quantity": {"type": "number", "default": 1}
                },
                "required": ["productId"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "remove_from_cart",
            description: "Remove an item from the logged-in user's cart",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "productId": {"type": "number"}
                },
                "required": ["productId"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "get_cart",
            description: "Get the current cart with product details and totals",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "clear_cart",
            description: "Remove every item from the cart",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
}

/// Cart mutations and reads require a logged-in user.
fn require_user(session: &Session) -> Result<u64, String> {
    session
        .current_user
        .as_ref()
        .map(|u| u.id)
        .ok_or_else(|| "User must be logged in".to_string())
}

pub async fn add_to_cart(
    gateway: &Gateway,
    session: &mut Session,
    args: &Value,
) -> Result<Value, String> {
    let user_id = require_user(session)?;
    let product_id = args["productId"].as_u64().ok_or("Missing productId")?;
    let quantity = match args.get("quantity").and_then(Value::as_u64) {
        Some(q) if q > 0 => q as u32,
        _ => 1,
    };

    cart::add_item(
        gateway,
        session,
        user_id,
        product_id,
        quantity,
        cart::now_ms(),
    )
    .await
    .map_err(|e| e.to_string())?;

    Ok(json!({"success": true, "productId": product_id, "quantity": quantity}))
}

pub async fn remove_from_cart(
    gateway: &Gateway,
    session: &mut Session,
    args: &Value,
) -> Result<Value, String> {
    let user_id = require_user(session)?;
    let product_id = args["productId"].as_u64().ok_or("Missing productId")?;

    cart::remove_item(gateway, session, user_id, product_id, cart::now_ms())
        .await
        .map_err(|e| e.to_string())?;

    Ok(json!({"success": true, "productId": product_id}))
}

/// Refresh the cache if stale, then enrich each line with a freshly fetched
/// product record and compute totals.
pub async fn get_cart(gateway: &Gateway, session: &mut Session) -> Result<Value, String> {
    let user_id = require_user(session)?;

    cart::refresh_for_read(gateway, session, user_id, cart::now_ms())
        .await
        .map_err(|e| e.to_string())?;

    let mut items = Vec::with_capacity(session.cart_items.len());
    let mut total_items: u64 = 0;
    let mut total_price: f64 = 0.0;
    for line in &session.cart_items {
        let product = gateway
            .product(line.product_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or("Product not found")?;
        total_items += u64::from(line.quantity);
        total_price += product.price * f64::from(line.quantity);
        items.push(json!({"product": product, "quantity": line.quantity}));
    }

    Ok(json!({
        "success": true,
        "cart": {
            "items": items,
            "totalItems": total_items,
            "totalPrice": total_price,
        }
    }))
}

/// Plain acknowledgment; no enrichment on the clear path.
pub async fn clear_cart(gateway: &Gateway, session: &mut Session) -> Result<Value, String> {
    let user_id = require_user(session)?;

    cart::clear(gateway, session, user_id, cart::now_ms())
        .await
        .map_err(|e| e.to_string())?;

    Ok(json!({"success": true}))
}
