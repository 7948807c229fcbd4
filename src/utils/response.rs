//! HTTP response envelope (§6) and `MatchingError` -> HTTP status mapping
//! (§7). The shape is part of the external contract: `{success, data}` on
//! success, `{success, data:{error}}` on failure — not the teacher's
//! `{success,data,error,timestamp}` shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::matching::MatchingError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data }
    }

    pub fn failure(data: T) -> Self {
        Self { success: false, data }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Thin wrapper so `MatchingError` can implement Axum's `IntoResponse`
/// without this crate owning `axum`'s traits for a foreign type.
#[derive(Debug)]
pub struct AppError(pub MatchingError);

impl From<MatchingError> for AppError {
    fn from(err: MatchingError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MatchingError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchingError::InsufficientStock(_) | MatchingError::PortfolioUpdateFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            MatchingError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchingError::Conflict(_) => StatusCode::CONFLICT,
            MatchingError::Dependency(_) | MatchingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ApiResponse::failure(ErrorBody {
            error: self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
