//! Error Handling Module
//!
//! Provides type-safe error handling with proper HTTP status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::judge::JudgeError;

/// API 에러 타입
///
/// # Design Decision
///
/// 각 에러 variant는 적절한 HTTP 상태 코드에 매핑됨
/// - 클라이언트 에러: 4xx (필드 누락, 서명/토큰 실패, 중복 제출 등)
/// - 업스트림 에러: 502 (AI Judge 실패 → 클라이언트가 재시도 가능)
/// - 서버 에러: 5xx (내부 오류)
///
/// 민감한 내부 정보는 클라이언트에 노출하지 않음
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Missing fields: {0}")]
    MissingFields(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ============ 401 Unauthorized ============
    #[error("Authentication token required")]
    NoToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Signature verification failed")]
    InvalidSignature,

    // ============ 404 Not Found ============
    #[error("User not found")]
    UserNotFound,

    #[error("Topic not found")]
    TopicNotFound,

    #[error("No topics available")]
    NoTopics,

    // ============ 409 Conflict ============
    #[error("Already submitted for this topic")]
    AlreadySubmitted,

    // ============ 502 Bad Gateway ============
    #[error("Scoring failed: {0}")]
    ScoringFailed(String),

    // ============ 500 Internal Server Error ============
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,
}

/// API 에러 응답 구조
///
/// 모든 에러는 `{"success": false, "error": {"code", "message"}}` 형태
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // 4xx 클라이언트 에러
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                "MISSING_FIELDS",
                format!("Required fields missing: {}", fields),
            ),
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            ApiError::NoToken => (
                StatusCode::UNAUTHORIZED,
                "NO_TOKEN",
                "Authentication token required".to_string(),
            ),
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or expired token".to_string(),
            ),
            ApiError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Signature verification failed".to_string(),
            ),
            ApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            ApiError::TopicNotFound => (
                StatusCode::NOT_FOUND,
                "TOPIC_NOT_FOUND",
                "Topic not found".to_string(),
            ),
            ApiError::NoTopics => (
                StatusCode::NOT_FOUND,
                "NO_TOPICS",
                "No topics available".to_string(),
            ),
            ApiError::AlreadySubmitted => (
                StatusCode::CONFLICT,
                "ALREADY_SUBMITTED",
                "You have already submitted for this topic".to_string(),
            ),

            // 502 업스트림 에러: "요청이 잘못됨"이 아니라 "나중에 다시 시도"
            ApiError::ScoringFailed(detail) => {
                tracing::error!("Judge failure: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "SCORING_FAILED",
                    "AI evaluation is currently unavailable, please retry".to_string(),
                )
            }

            // 5xx 서버 에러: 내부 에러는 클라이언트에 상세 정보 노출 안 함
            ApiError::DatabaseError(_) => {
                tracing::error!("Database error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVER_ERROR",
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalError => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVER_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// SQLx 에러를 ApiError로 변환
///
/// submissions의 UNIQUE(user_id, topic_id) 위반은 ALREADY_SUBMITTED로 매핑:
/// 중복 제출 차단은 스토리지 제약으로 강제되므로, 두 요청이 동시에
/// 사전 체크를 통과해도 insert 시점에 정확히 하나만 성공한다.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::AlreadySubmitted;
            }
        }
        tracing::error!("SQLx error: {:?}", err);
        ApiError::DatabaseError(err.to_string())
    }
}

/// Judge 에러는 전부 SCORING_FAILED로 분류 (부분 결과 전파 금지)
impl From<JudgeError> for ApiError {
    fn from(err: JudgeError) -> Self {
        ApiError::ScoringFailed(err.to_string())
    }
}
