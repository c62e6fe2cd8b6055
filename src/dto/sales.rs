use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Sale;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price the buyer saw, in minor units; recorded on the sale line.
    pub unit_price: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    /// Client-computed total; verified against the line items server-side.
    pub total: i64,
    pub payment_method: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub sale_id: Uuid,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct SaleLineDetail {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: Sale,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<SaleLineDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleList {
    pub items: Vec<SaleWithLines>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct PeriodSalesStats {
    pub sales: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct TopProduct {
    pub id: Uuid,
    pub name: String,
    pub total_sold: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesStats {
    pub today: PeriodSalesStats,
    pub week: PeriodSalesStats,
    pub month: PeriodSalesStats,
    pub top_products: Vec<TopProduct>,
}
