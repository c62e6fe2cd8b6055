use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    db::DbPool,
    dto::products::ProductList,
    error::AppResult,
    response::ApiResponse,
    routes::params::SearchQuery,
    services::product_service,
};

#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("q" = Option<String>, Query, description = "Search term")
    ),
    responses(
        (status = 200, description = "Search results", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(pool): State<DbPool>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let q = query.q.unwrap_or_default();
    let resp = product_service::search_products(&pool, &q).await?;
    Ok(Json(resp))
}
