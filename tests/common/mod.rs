#![allow(dead_code)]

//! Shared test harness: an in-process mock of the commerce gateway plus
//! helpers for wiring an MCP app against it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Json;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use fakestore_mcp::gateway::Gateway;
use fakestore_mcp::mcp;
use fakestore_mcp::mcp::session::SessionStore;

/// Demo credentials the mock gateway accepts.
pub const DEMO_USER: &str = "johnd";
pub const DEMO_PASS: &str = "m38rmF$";

/// Credentials for a user the gateway authenticates but does not list,
/// exercising the token-without-user login path.
pub const GHOST_USER: &str = "ghost";
pub const GHOST_PASS: &str = "boo";

/// Observable state of the mock gateway.
#[derive(Clone, Default)]
pub struct MockGateway {
    pub carts: Arc<Mutex<Vec<Value>>>,
    next_cart_id: Arc<AtomicU64>,
    /// Number of PUT /carts/{id} calls observed.
    pub cart_updates: Arc<AtomicU64>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_cart_id: Arc::new(AtomicU64::new(100)),
            ..Self::default()
        }
    }

    /// Pre-seed a persisted cart, returning its id.
    pub fn seed_cart(&self, user_id: u64, date: &str, products: Value) -> u64 {
        let id = self.next_cart_id.fetch_add(1, Ordering::SeqCst);
        self.carts.lock().unwrap().push(json!({
            "id": id,
            "userId": user_id,
            "date": date,
            "products": products,
        }));
        id
    }

    pub fn carts_for_user(&self, user_id: u64) -> Vec<Value> {
        self.carts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c["userId"] == json!(user_id))
            .cloned()
            .collect()
    }

    pub fn update_count(&self) -> u64 {
        self.cart_updates.load(Ordering::SeqCst)
    }
}

fn products_fixture() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "title": "Wireless Headphones",
            "price": 109.95,
            "description": "Over-ear, noise cancelling",
            "category": "electronics",
            "image": "https://store.example/img/1.jpg",
            "rating": {"rate": 4.1, "count": 210}
        }),
        json!({
            "id": 2,
            "title": "USB-C Hub",
            "price": 22.3,
            "description": "7-in-1",
            "category": "electronics",
            "image": "https://store.example/img/2.jpg",
            "rating": {"rate": 3.8, "count": 95}
        }),
        json!({
            "id": 3,
            "title": "Silver Ring",
            "price": 55.99,
            "description": "Sterling silver",
            "category": "jewelery",
            "image": "https://store.example/img/3.jpg",
            "rating": {"rate": 4.6, "count": 40}
        }),
    ]
}

fn users_fixture() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "username": "johnd",
            "email": "john@store.example",
            "name": {"firstname": "john", "lastname": "doe"}
        }),
        json!({
            "id": 2,
            "username": "mor_2314",
            "email": "mor@store.example",
            "name": {"firstname": "david", "lastname": "morrison"}
        }),
    ]
}

async fn mock_login(Json(body): Json<Value>) -> impl IntoResponse {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let accepted = (username == DEMO_USER && password == DEMO_PASS)
        || (username == GHOST_USER && password == GHOST_PASS);
    if accepted {
        (
            StatusCode::OK,
            Json(json!({"token": format!("token-{username}")})),
        )
            .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "username or password is incorrect").into_response()
    }
}

async fn mock_users() -> Json<Value> {
    Json(json!(users_fixture()))
}

async fn mock_products(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let mut products = products_fixture();
    if let Some(limit) = params.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        products.truncate(limit);
    }
    Json(json!(products))
}

async fn mock_product(Path(id): Path<u64>) -> impl IntoResponse {
    match products_fixture().into_iter().find(|p| p["id"] == json!(id)) {
        Some(product) => (StatusCode::OK, Json(product)).into_response(),
        None => (StatusCode::NOT_FOUND, "").into_response(),
    }
}

async fn mock_products_by_category(Path(category): Path<String>) -> Json<Value> {
    let products: Vec<Value> = products_fixture()
        .into_iter()
        .filter(|p| p["category"] == json!(category))
        .collect();
    Json(json!(products))
}

async fn mock_categories() -> Json<Value> {
    Json(json!(["electronics", "jewelery"]))
}

async fn mock_carts_by_user(
    State(state): State<MockGateway>,
    Path(user_id): Path<u64>,
) -> Json<Value> {
    Json(json!(state.carts_for_user(user_id)))
}

async fn mock_create_cart(
    State(state): State<MockGateway>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    let id = state.next_cart_id.fetch_add(1, Ordering::SeqCst);
    body["id"] = json!(id);
    state.carts.lock().unwrap().push(body.clone());
    Json(body)
}

async fn mock_update_cart(
    State(state): State<MockGateway>,
    Path(cart_id): Path<u64>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    state.cart_updates.fetch_add(1, Ordering::SeqCst);
    body["id"] = json!(cart_id);
    let mut carts = state.carts.lock().unwrap();
    match carts.iter_mut().find(|c| c["id"] == json!(cart_id)) {
        Some(cart) => *cart = body.clone(),
        None => carts.push(body.clone()),
    }
    Json(body)
}

fn mock_router(state: MockGateway) -> Router {
    Router::new()
        .route("/auth/login", post(mock_login))
        .route("/users", get(mock_users))
        .route("/products", get(mock_products))
        .route("/products/categories", get(mock_categories))
        .route("/products/category/{category}", get(mock_products_by_category))
        .route("/products/{id}", get(mock_product))
        .route("/carts/user/{user_id}", get(mock_carts_by_user))
        .route("/carts", post(mock_create_cart))
        .route("/carts/{cart_id}", put(mock_update_cart))
        .with_state(state)
}

async fn serve_on_ephemeral_port(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Start a mock gateway on an ephemeral port.
pub async fn spawn_mock_gateway() -> (MockGateway, SocketAddr) {
    let state = MockGateway::new();
    let addr = serve_on_ephemeral_port(mock_router(state.clone())).await;
    (state, addr)
}

/// Build an MCP app wired to the given mock gateway address.
pub fn mcp_app(gateway_addr: SocketAddr) -> Router {
    let gateway = Arc::new(Gateway::new(&format!("http://{gateway_addr}")));
    mcp::router(gateway, SessionStore::new())
}

/// Start a full MCP server against a fresh mock gateway. Returns the mock
/// state and the MCP endpoint URL.
pub async fn spawn_mcp_server() -> (MockGateway, String) {
    let (mock, gateway_addr) = spawn_mock_gateway().await;
    let addr = serve_on_ephemeral_port(mcp_app(gateway_addr)).await;
    (mock, format!("http://{addr}/mcp"))
}
