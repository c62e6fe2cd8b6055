use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_categories: i64,
    /// Products with 0 < stock < 5.
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub featured: i64,
    pub total_sales: i64,
    pub total_revenue: i64,
    pub latest_products: Vec<ProductSummary>,
}
