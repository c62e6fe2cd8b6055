use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound | AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse::failure(
            self.to_string(),
            ErrorData {
                error: self.to_string(),
            },
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
