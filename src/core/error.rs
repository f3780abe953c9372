//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::app::users::store::StoreError;

/// 核心错误类型（HTTP 边界）
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

/// 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, error_message, user_message) = match self {
            CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            CoreError::InternalServerError(msg) => {
                // 内部细节只写日志，不返回给客户端
                error!(reason = %msg, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }
        };

        let body = ErrorResponse::new(status, error_message, user_message);
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CoreError::NotFound(format!("User {id} not found")),
            other => CoreError::InternalServerError(other.to_string()),
        }
    }
}

/// 未匹配路由的兜底处理器
pub async fn not_found_fallback() -> CoreError {
    CoreError::NotFound("The requested page does not exist".to_string())
}

/// `CatchPanicLayer` 的 500 响应
pub fn panic_response(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("handler panicked, returning generic 500");
    let body = ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_SERVER_ERROR",
        "An unexpected error occurred. Please try again later.",
    );
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let not_found: CoreError = StoreError::NotFound(3).into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let broken: CoreError = StoreError::Database(sqlx::Error::PoolClosed).into();
        assert_eq!(
            broken.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_panic_response_is_generic_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
