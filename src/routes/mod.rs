use axum::{Router, routing::get};

use crate::db::DbPool;

pub mod admin;
pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod sales;
pub mod search;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<DbPool> {
    Router::new()
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/sales", sales::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .route("/search", get(search::search_products))
}
