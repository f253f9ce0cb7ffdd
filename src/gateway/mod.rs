pub mod models;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{GatewayError, GatewayResult};
use models::{CartLine, Product, RemoteCart, User};

/// Client for the remote commerce REST API. Stateless; every call is a
/// single request against the gateway, which is treated as the source of
/// truth for products, users, and carts.
#[derive(Debug, Clone)]
pub struct Gateway {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct AuthToken {
    token: String,
}

impl Gateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status {
                status: resp.status().as_u16(),
                endpoint: path.to_string(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Authenticate against the gateway. `Ok(None)` means the gateway
    /// rejected the credentials; transport failures are `Err`.
    pub async fn login(&self, username: &str, password: &str) -> GatewayResult<Option<String>> {
        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let auth: AuthToken = resp.json().await?;
        Ok(Some(auth.token))
    }

    pub async fn users(&self) -> GatewayResult<Vec<User>> {
        self.get_json("/users").await
    }

    pub async fn products(
        &self,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> GatewayResult<Vec<Product>> {
        self.get_json(&products_path(category, limit)).await
    }

    /// Fetch a single product. `Ok(None)` when the gateway has no such id.
    pub async fn product(&self, id: u64) -> GatewayResult<Option<Product>> {
        let resp = self
            .http
            .get(format!("{}/products/{id}", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(Some(resp.json().await?))
    }

    pub async fn categories(&self) -> GatewayResult<Vec<String>> {
        self.get_json("/products/categories").await
    }

    pub async fn carts_by_user(&self, user_id: u64) -> GatewayResult<Vec<RemoteCart>> {
        self.get_json(&format!("/carts/user/{user_id}")).await
    }

    pub async fn create_cart(&self, user_id: u64, items: &[CartLine]) -> GatewayResult<RemoteCart> {
        let body = json!({
            "userId": user_id,
            "date": chrono::Utc::now().format("%Y-%m-%d").to_string(),
            "products": items,
        });
        let resp = self
            .http
            .post(format!("{}/carts", self.base_url))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status {
                status: resp.status().as_u16(),
                endpoint: "/carts".to_string(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Replace the full line list of a persisted cart.
    pub async fn update_cart(
        &self,
        cart_id: u64,
        user_id: u64,
        items: &[CartLine],
    ) -> GatewayResult<RemoteCart> {
        let body = json!({
            "userId": user_id,
            "date": chrono::Utc::now().format("%Y-%m-%d").to_string(),
            "products": items,
        });
        let resp = self
            .http
            .put(format!("{}/carts/{cart_id}", self.base_url))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status {
                status: resp.status().as_u16(),
                endpoint: format!("/carts/{cart_id}"),
            });
        }
        Ok(resp.json().await?)
    }
}

/// Products endpoint path. A category filter selects the gateway's category
/// endpoint; the limit parameter only applies to the unfiltered listing.
fn products_path(category: Option<&str>, limit: Option<u32>) -> String {
    match (category, limit) {
        (Some(cat), _) => format!("/products/category/{cat}"),
        (None, Some(n)) => format!("/products?limit={n}"),
        (None, None) => "/products".to_string(),
    }
}
