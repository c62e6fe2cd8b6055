use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::products::{ProductList, ProductWithCategory},
    error::AppResult,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::product_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_products))
        .route("/featured", get(list_featured))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Filter by category name"),
        ("featured" = Option<bool>, Query, description = "Filter by featured flag"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(pool): State<DbPool>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&pool, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Featured products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_featured(
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_featured(&pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductWithCategory>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    Path(id): Path<Uuid>,
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<ProductWithCategory>>> {
    let resp = product_service::get_product(&pool, id).await?;
    Ok(Json(resp))
}
