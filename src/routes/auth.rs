use axum::{Json, Router, extract::State, routing::post};

use crate::{
    db::DbPool,
    dto::auth::{LoginRequest, LoginResponse},
    error::AppResult,
    response::ApiResponse,
    services::auth_service::login_user,
};

pub fn router() -> Router<DbPool> {
    Router::new().route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(pool): State<DbPool>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(&pool, payload).await?;
    Ok(Json(resp))
}
