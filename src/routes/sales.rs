use axum::{Json, Router, extract::State, routing::post};

use crate::{
    db::DbPool,
    dto::sales::{CheckoutRequest, CheckoutResponse},
    error::AppResult,
    response::ApiResponse,
    services::sale_service,
};

pub fn router() -> Router<DbPool> {
    Router::new().route("/", post(checkout))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Sale recorded", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Empty cart, invalid line item or total mismatch"),
        (status = 404, description = "Referenced product does not exist"),
        (status = 409, description = "Insufficient stock"),
    ),
    tag = "Sales"
)]
pub async fn checkout(
    State(pool): State<DbPool>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let resp = sale_service::create_sale(&pool, payload).await?;
    Ok(Json(resp))
}
