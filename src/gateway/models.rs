use serde::{Deserialize, Serialize};

/// A product record as served by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

/// A user record from the gateway's user list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<UserName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserName {
    pub firstname: String,
    pub lastname: String,
}

/// One cart line item. Quantity is always positive in stored state;
/// a quantity of zero means removal and is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u32,
}

/// A persisted cart as the gateway stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    pub id: u64,
    pub user_id: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub products: Vec<CartLine>,
}
