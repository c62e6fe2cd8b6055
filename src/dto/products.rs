use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub previous_price: Option<i64>,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub discount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub previous_price: Option<i64>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
    pub discount: Option<i32>,
}

/// Product row as the storefront sees it, with the category joined in.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProductWithCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub previous_price: Option<i64>,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub featured: bool,
    pub discount: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductWithCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteProductOutcome {
    /// True when the product had sale history and was archived instead of
    /// removed.
    pub archived: bool,
}
