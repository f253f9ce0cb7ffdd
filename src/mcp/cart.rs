//! Cart cache protocol: TTL-bounded session cache of the user's remote
//! cart, kept write-through consistent with the gateway except across the
//! TTL-expiry reconciliation path.

use crate::error::GatewayResult;
use crate::gateway::Gateway;
use crate::gateway::models::{CartLine, RemoteCart};
use crate::mcp::session::Session;

/// How long cached cart state stays trustworthy.
pub const CART_TTL_MS: i64 = 30 * 60 * 1000;

/// Current time as epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A cache that has never been refreshed, or whose age strictly exceeds the
/// TTL, is stale. An age of exactly `CART_TTL_MS` is still fresh.
pub fn is_stale(session: &Session, now: i64) -> bool {
    session.cart_timestamp == 0 || now - session.cart_timestamp > CART_TTL_MS
}

/// Newest cart by `date`; ties go to the last one encountered.
fn pick_latest(carts: &[RemoteCart]) -> Option<&RemoteCart> {
    let mut latest: Option<&RemoteCart> = None;
    for cart in carts {
        match latest {
            Some(best) if cart.date < best.date => {}
            _ => latest = Some(cart),
        }
    }
    latest
}

/// Read-path refresh: when the cache is stale, adopt the user's most recent
/// persisted cart, or create an empty one when none exist.
pub async fn refresh_for_read(
    gateway: &Gateway,
    session: &mut Session,
    user_id: u64,
    now: i64,
) -> GatewayResult<()> {
    if !is_stale(session, now) {
        return Ok(());
    }
    let carts = gateway.carts_by_user(user_id).await?;
    if let Some(latest) = pick_latest(&carts) {
        tracing::debug!(cart_id = latest.id, user_id, "adopting remote cart");
        session.cart_id = Some(latest.id);
        session.cart_items = latest.products.clone();
    } else {
        let created = gateway.create_cart(user_id, &[]).await?;
        tracing::debug!(cart_id = created.id, user_id, "created cart for read");
        session.cart_id = Some(created.id);
        session.cart_items = Vec::new();
    }
    session.cart_timestamp = now;
    Ok(())
}

/// Write-path cart establishment. With no known cart id, a fresh empty cart
/// is created and the mutation applies against an empty list; the user's
/// existing remote carts are deliberately not consulted here. The read path
/// is the only reconciliation point.
async fn establish_cart(
    gateway: &Gateway,
    session: &mut Session,
    user_id: u64,
) -> GatewayResult<u64> {
    if let Some(id) = session.cart_id {
        return Ok(id);
    }
    let created = gateway.create_cart(user_id, &[]).await?;
    tracing::debug!(cart_id = created.id, user_id, "created cart for write");
    session.cart_id = Some(created.id);
    session.cart_items = Vec::new();
    Ok(created.id)
}

/// Merge a quantity into the line list. Existing lines accumulate.
fn apply_add(items: &mut Vec<CartLine>, product_id: u64, quantity: u32) {
    if let Some(line) = items.iter_mut().find(|l| l.product_id == product_id) {
        line.quantity += quantity;
    } else {
        items.push(CartLine {
            product_id,
            quantity,
        });
    }
}

fn apply_remove(items: &mut Vec<CartLine>, product_id: u64) {
    items.retain(|l| l.product_id != product_id);
}

/// Add a line to the cached cart and synchronously push the full line list
/// to the gateway before returning.
pub async fn add_item(
    gateway: &Gateway,
    session: &mut Session,
    user_id: u64,
    product_id: u64,
    quantity: u32,
    now: i64,
) -> GatewayResult<()> {
    let cart_id = establish_cart(gateway, session, user_id).await?;
    apply_add(&mut session.cart_items, product_id, quantity);
    session.cart_timestamp = now;
    gateway
        .update_cart(cart_id, user_id, &session.cart_items)
        .await?;
    Ok(())
}

/// Remove a line from the cached cart and push the remainder.
pub async fn remove_item(
    gateway: &Gateway,
    session: &mut Session,
    user_id: u64,
    product_id: u64,
    now: i64,
) -> GatewayResult<()> {
    let cart_id = establish_cart(gateway, session, user_id).await?;
    apply_remove(&mut session.cart_items, product_id);
    session.cart_timestamp = now;
    gateway
        .update_cart(cart_id, user_id, &session.cart_items)
        .await?;
    Ok(())
}

/// Empty the cart, creating one first if none is known, and push the empty
/// list.
pub async fn clear(
    gateway: &Gateway,
    session: &mut Session,
    user_id: u64,
    now: i64,
) -> GatewayResult<()> {
    let cart_id = establish_cart(gateway, session, user_id).await?;
    session.cart_items.clear();
    session.cart_timestamp = now;
    gateway.update_cart(cart_id, user_id, &[]).await?;
    Ok(())
}
