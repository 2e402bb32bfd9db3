use crate::application::lending::LendingApplicationError;
use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// アプリケーション層のエラー
    Application(LendingApplicationError),
    /// リクエストの入力が不正
    BadRequest(String),
}

impl From<LendingApplicationError> for ApiError {
    fn from(err: LendingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

/// 本文の抽出失敗（不正なJSON、欠けたフィールド）を 400 に変換する
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` と同じだが、抽出失敗を `ApiError` として返す
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Application(err) => err,
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse::new("BAD_REQUEST", msg));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
        };

        let (status, error_type, message) = match err {
            // 404 Not Found - リクエストされたリソースが存在しない
            LendingApplicationError::BookNotFound => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Book not found".to_string())
            }
            LendingApplicationError::PatronNotFound => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Patron not found".to_string())
            }

            // 403 Forbidden - 役割に許可されていない操作
            LendingApplicationError::NotPermitted(role) => (
                StatusCode::FORBIDDEN,
                "NOT_PERMITTED",
                format!("Operation not permitted for {}", role),
            ),

            // 422 Unprocessable Entity - ビジネスルール違反
            LendingApplicationError::InvalidState(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_STATE", msg)
            }
            LendingApplicationError::NotEligible => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOT_ELIGIBLE",
                "You cannot borrow books at this time".to_string(),
            ),
            LendingApplicationError::NoSuchLoan => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_SUCH_LOAN",
                "You have not borrowed this book".to_string(),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LendingApplicationError::StoreError(e) => {
                tracing::error!("Library store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Failed to access library store".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
