//! Client-side cart synchronizer.
//!
//! Holds an optimistic local copy of the cart, mirrors it to durable
//! storage on every change, and pushes mutations through the RPC client:
//! immediately for adds/removes/explicit quantity sets, and through a
//! debounced coalescing window for rapid increment/decrement bursts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use super::{ClientResult, RpcClient};
use crate::gateway::models::Product;

/// Quiet period before coalesced quantity updates are flushed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// One optimistic cart line with its full product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCartItem {
    pub product: Product,
    pub quantity: u32,
}

/// Durable mirror of the local item list. Read once at initialization,
/// written on every state transition.
pub trait CartStorage: Send + Sync {
    fn load(&self) -> Option<Vec<LocalCartItem>>;
    fn save(&self, items: &[LocalCartItem]);
}

/// JSON-file storage, the durable-key equivalent for a native client.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Option<Vec<LocalCartItem>> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn save(&self, items: &[LocalCartItem]) {
        match serde_json::to_vec(items) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&self.path, data) {
                    tracing::warn!(path = %self.path.display(), error = %e, "cart save failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "cart serialization failed"),
        }
    }
}

/// In-memory storage for tests and embedding.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<Option<Vec<LocalCartItem>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Option<Vec<LocalCartItem>> {
        self.items.lock().unwrap().clone()
    }

    fn save(&self, items: &[LocalCartItem]) {
        *self.items.lock().unwrap() = Some(items.to_vec());
    }
}

#[derive(Default)]
struct LocalState {
    items: Vec<LocalCartItem>,
    /// Latest desired absolute quantity per product id; last write wins.
    pending: HashMap<u64, u32>,
    timer: Option<JoinHandle<()>>,
}

struct SyncInner {
    rpc: AsyncMutex<RpcClient>,
    storage: Box<dyn CartStorage>,
    state: Mutex<LocalState>,
    /// Single-flight guard: at most one flush runs at a time.
    flush_lock: AsyncMutex<()>,
    debounce: Duration,
}

/// Optimistic cart mirror with immediate and debounced write-through.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<SyncInner>,
}

impl CartSynchronizer {
    pub fn new(rpc: RpcClient, storage: Box<dyn CartStorage>) -> Self {
        Self::with_debounce(rpc, storage, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        rpc: RpcClient,
        storage: Box<dyn CartStorage>,
        debounce: Duration,
    ) -> Self {
        let items = storage.load().unwrap_or_default();
        Self {
            inner: Arc::new(SyncInner {
                rpc: AsyncMutex::new(rpc),
                storage,
                state: Mutex::new(LocalState {
                    items,
                    ..LocalState::default()
                }),
                flush_lock: AsyncMutex::new(()),
                debounce,
            }),
        }
    }

    pub fn items(&self) -> Vec<LocalCartItem> {
        self.inner.state.lock().unwrap().items.clone()
    }

    pub fn total_items(&self) -> u64 {
        self.items().iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.items()
            .iter()
            .map(|i| i.product.price * f64::from(i.quantity))
            .sum()
    }

    /// Immediate write-through add: merge locally, persist, then push.
    pub async fn add_item(&self, product: Product, quantity: u32) -> ClientResult<()> {
        let product_id = product.id;
        {
            let mut state = self.inner.state.lock().unwrap();
            if let Some(item) = state.items.iter_mut().find(|i| i.product.id == product_id) {
                item.quantity += quantity;
            } else {
                state.items.push(LocalCartItem { product, quantity });
            }
            self.inner.storage.save(&state.items);
        }
        let mut rpc = self.inner.rpc.lock().await;
        rpc.add_to_cart(product_id, quantity).await?;
        Ok(())
    }

    /// Immediate write-through removal.
    pub async fn remove_item(&self, product_id: u64) -> ClientResult<()> {
        {
            let mut state = self.inner.state.lock().unwrap();
            state.items.retain(|i| i.product.id != product_id);
            self.inner.storage.save(&state.items);
        }
        let mut rpc = self.inner.rpc.lock().await;
        rpc.remove_from_cart(product_id).await?;
        Ok(())
    }

    /// Immediate write-through quantity set. Zero maps to a removal; any
    /// positive value maps to an add with that absolute quantity.
    pub async fn set_quantity(&self, product_id: u64, quantity: u32) -> ClientResult<()> {
        {
            let mut state = self.inner.state.lock().unwrap();
            for item in state.items.iter_mut() {
                if item.product.id == product_id {
                    item.quantity = quantity;
                }
            }
            state.items.retain(|i| i.quantity > 0);
            self.inner.storage.save(&state.items);
        }
        let mut rpc = self.inner.rpc.lock().await;
        if quantity == 0 {
            rpc.remove_from_cart(product_id).await?;
        } else {
            rpc.add_to_cart(product_id, quantity).await?;
        }
        Ok(())
    }

    /// Debounced increment of a line already in the cart.
    pub fn increment(&self, product_id: u64) {
        self.bump(product_id, 1);
    }

    /// Debounced decrement of a line already in the cart. Reaching zero
    /// removes the line locally and flushes as a removal.
    pub fn decrement(&self, product_id: u64) {
        self.bump(product_id, -1);
    }

    fn bump(&self, product_id: u64, delta: i64) {
        {
            let mut state = self.inner.state.lock().unwrap();
            let Some(item) = state.items.iter_mut().find(|i| i.product.id == product_id) else {
                return;
            };
            let new_quantity = (i64::from(item.quantity) + delta).max(0) as u32;
            item.quantity = new_quantity;
            state.items.retain(|i| i.quantity > 0);
            state.pending.insert(product_id, new_quantity);
            self.inner.storage.save(&state.items);
        }
        self.restart_timer();
    }

    /// (Re)start the debounce timer; each bump pushes the flush out by the
    /// full quiet period.
    fn restart_timer(&self) {
        let sync = self.clone();
        let debounce = self.inner.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Err(e) = sync.flush().await {
                tracing::warn!(error = %e, "debounced cart flush failed");
            }
        });

        let mut state = self.inner.state.lock().unwrap();
        if let Some(old) = state.timer.replace(handle) {
            old.abort();
        }
    }

    /// Flush all pending coalesced updates: per product, a removal followed
    /// by an add with the resolved quantity (nothing when it resolved to
    /// zero), then reconcile against the server cart.
    pub async fn flush(&self) -> ClientResult<()> {
        let _flight = self.inner.flush_lock.lock().await;

        let pending: Vec<(u64, u32)> = {
            let mut state = self.inner.state.lock().unwrap();
            state.pending.drain().collect()
        };
        if pending.is_empty() {
            return Ok(());
        }

        let mut rpc = self.inner.rpc.lock().await;
        for (product_id, quantity) in pending {
            rpc.remove_from_cart(product_id).await?;
            if quantity > 0 {
                rpc.add_to_cart(product_id, quantity).await?;
            }
        }

        // Adopt the server cart only when it disagrees with the optimistic
        // state, so unrelated changes made during the flush survive.
        let payload = rpc.get_cart().await?;
        drop(rpc);
        if let Ok(server_items) =
            serde_json::from_value::<Vec<LocalCartItem>>(payload["cart"]["items"].clone())
        {
            let mut state = self.inner.state.lock().unwrap();
            if carts_differ(&state.items, &server_items) {
                state.items = server_items;
                self.inner.storage.save(&state.items);
            }
        }
        Ok(())
    }

    /// Clear the cart: cancel any pending debounce, discard unflushed
    /// updates, and push the clear.
    pub async fn clear(&self) -> ClientResult<()> {
        {
            let mut state = self.inner.state.lock().unwrap();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.pending.clear();
            state.items.clear();
            self.inner.storage.save(&state.items);
        }
        let mut rpc = self.inner.rpc.lock().await;
        rpc.clear_cart().await?;
        Ok(())
    }

    /// Whether a coalesced update is waiting for its quiet period.
    pub fn has_pending(&self) -> bool {
        !self.inner.state.lock().unwrap().pending.is_empty()
    }

    /// Log in through the underlying RPC client.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<serde_json::Value> {
        let mut rpc = self.inner.rpc.lock().await;
        rpc.login(username, password).await
    }
}

/// Item-count or any per-product quantity mismatch.
fn carts_differ(local: &[LocalCartItem], server: &[LocalCartItem]) -> bool {
    if local.len() != server.len() {
        return true;
    }
    local.iter().any(|l| {
        server
            .iter()
            .find(|s| s.product.id == l.product.id)
            .is_none_or(|s| s.quantity != l.quantity)
    })
}
