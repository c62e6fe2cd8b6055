use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{categories::CategoryList, products::ProductList},
    error::AppResult,
    response::ApiResponse,
    services::category_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_categories))
        .route("/{id}/products", get(category_products))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories with product counts", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/products",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Products of a category", body = ApiResponse<ProductList>),
        (status = 404, description = "Category not found"),
    ),
    tag = "Categories"
)]
pub async fn category_products(
    Path(id): Path<Uuid>,
    State(pool): State<DbPool>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = category_service::category_products(&pool, id).await?;
    Ok(Json(resp))
}
