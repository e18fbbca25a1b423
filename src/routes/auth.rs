//! Auth Endpoints
//!
//! 지갑 서명 기반 로그인. 서명이 검증되면 사용자를 get-or-create 하고
//! 7일 만료 JWT를 발급한다

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, services::auth::verify_signature, types::WalletAddress, AppState};

/// 로그인 요청
///
/// 필드를 Option으로 받아 MISSING_FIELDS를 자체 에러 포맷으로 반환
/// (serde rejection의 422 대신 API 규약의 400)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub wallet_address: Option<String>,
    pub signature: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub wallet_address: String,
}

/// POST /auth/login
///
/// # Flow
///
/// 1. 필드 존재 + 주소 형식 검증
/// 2. (message, signature)에서 서명자 복구 → 주장된 주소와 비교
/// 3. 사용자 upsert (신규 생성 또는 last_login 갱신)
/// 4. JWT 발급
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(wallet), Some(signature), Some(message)) =
        (req.wallet_address, req.signature, req.message)
    else {
        return Err(ApiError::MissingFields(
            "walletAddress, signature, message".to_string(),
        ));
    };

    let address = WalletAddress::new(&wallet).map_err(ApiError::ValidationError)?;

    if !verify_signature(&message, &signature, address.as_str()) {
        tracing::warn!(wallet = %address.as_str(), "signature verification failed");
        return Err(ApiError::InvalidSignature);
    }

    let user = state.db.get_or_create_user(address.as_str()).await?;

    let token = state
        .tokens
        .issue(&user.wallet_address)
        .map_err(|_| ApiError::InternalError)?;

    tracing::info!(wallet = %user.wallet_address, "login succeeded");

    Ok(Json(LoginResponse {
        success: true,
        token,
        wallet_address: user.wallet_address,
    }))
}
