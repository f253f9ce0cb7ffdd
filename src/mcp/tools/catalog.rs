use serde_json::{Value, json};

use super::ToolDef;
use crate::gateway::Gateway;

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "get_products",
            description: "Get all products, or filter by category",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {"type": "string", "description": "Category to filter by"},
                    "limit": {"type": "number", "description": "Cap the unfiltered listing"}
                },
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "get_product",
            description: "Get a single product by ID",
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
            name: "get_categories",
            description: "Get all product categories",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
}

pub async fn get_products(gateway: &Gateway, args: &Value) -> Result<Value, String> {
    let category = args.get("category").and_then(Value::as_str);
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map(|n| n as u32);

    let products = gateway
        .products(category, limit)
        .await
        .map_err(|e| e.to_string())?;
    let count = products.len();
    Ok(json!({"success": true, "products": products, "count": count}))
}

/// A missing product is a thrown error here, unlike `login`'s soft failure.
/// Both policies are deliberate and pinned by tests.
pub async fn get_product(gateway: &Gateway, args: &Value) -> Result<Value, String> {
    let product_id = args["productId"].as_u64().ok_or("Missing productId")?;

    let product = gateway
        .product(product_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("Product not found")?;

    Ok(json!({"success": true, "product": product}))
}

pub async fn get_categories(gateway: &Gateway) -> Result<Value, String> {
    let categories = gateway.categories().await.map_err(|e| e.to_string())?;
    Ok(json!({"success": true, "categories": categories}))
}
