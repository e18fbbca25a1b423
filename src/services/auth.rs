//! Auth Service
//!
//! # Interview Q&A
//!
//! Q: 비밀번호 없이 지갑 서명만으로 어떻게 로그인하는가?
//! A: EIP-191 personal message 서명 복구
//!    1. 클라이언트가 메시지에 지갑으로 서명
//!    2. 서버가 (message, signature)에서 서명자 주소를 복구
//!    3. 복구된 주소 == 주장한 주소 (case-insensitive) → 본인 증명
//!    서버는 개인키를 절대 받지 않음
//!
//! Q: JWT vs 서버 세션, 왜 JWT인가?
//! A: stateless 인증
//!    - 세션 저장소 불필요 (DB 조회 없이 검증)
//!    - 수평 확장 용이
//!    - 트레이드오프: 발급 후 7일 만료 전까지 회수 불가
//!
//! Q: 토큰 검증은 어디서 하는가?
//! A: axum extractor (`AuthenticatedWallet`)
//!    - 핸들러 시그니처에 선언하는 것만으로 보호 라우트가 됨
//!    - 헤더 누락 → NO_TOKEN, 변조/만료 → INVALID_TOKEN

use std::str::FromStr;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use chrono::{Duration, Utc};
use ethers::types::{Signature, SignatureError};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, AppState};

/// 세션 토큰 수명 (일)
const TOKEN_TTL_DAYS: i64 = 7;

// ============ Signature Verification ============

/// (message, signature)에서 서명자 주소 복구
///
/// EIP-191 prefix 해싱은 ethers가 처리. 반환 주소는 lowercase `0x...` hex
pub fn recover_signer(message: &str, signature: &str) -> Result<String, SignatureError> {
    let sig = Signature::from_str(signature)?;
    let address = sig.recover(message)?;
    Ok(format!("{:#x}", address))
}

/// 서명이 주장된 주소의 것인지 검증 (case-insensitive)
///
/// 파싱/복구 실패는 전부 "검증 실패"로 취급
pub fn verify_signature(message: &str, signature: &str, claimed_address: &str) -> bool {
    match recover_signer(message, signature) {
        Ok(recovered) => recovered.eq_ignore_ascii_case(claimed_address),
        Err(_) => false,
    }
}

// ============ Session Tokens ============

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 검증이 끝난 지갑 주소 (lowercase)
    pub wallet_address: String,

    /// 발급 시간 (Unix timestamp)
    pub iat: i64,

    /// 만료 시간 (Unix timestamp)
    pub exp: i64,
}

/// JWT 발급/검증 서비스 (HS256)
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// 7일 만료 토큰 발급
    pub fn issue(&self, wallet_address: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            wallet_address: wallet_address.to_lowercase(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// 토큰 검증. 만료/변조는 구분 없이 InvalidToken
    /// (클라이언트 관점에서 둘 다 "다시 로그인")
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}

// ============ Extractor ============

/// 인증된 지갑 (JWT에서 추출)
///
/// 사용법:
/// ```rust,ignore
/// pub async fn get_stats(
///     State(state): State<AppState>,
///     wallet: AuthenticatedWallet,  // <- 이것만으로 보호 라우트
/// ) -> Result<...> {
///     let address = wallet.address;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    /// lowercase 지갑 주소
    pub address: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedWallet {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Authorization: Bearer <token>
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(ApiError::NoToken)?
            .to_str()
            .map_err(|_| ApiError::NoToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::NoToken)?;

        let claims = state.tokens.verify(token)?;

        Ok(AuthenticatedWallet {
            address: claims.wallet_address.to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};

    // Anvil 기본 계정 #0 (테스트 전용 키)
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn signed_triple(message: &str) -> (String, String) {
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        let sig = wallet.sign_message(message).await.unwrap();
        (format!("{:#x}", wallet.address()), sig.to_string())
    }

    #[tokio::test]
    async fn test_valid_signature_recovers_signer() {
        let (address, sig) = signed_triple("Sign in to Writing Arena").await;
        let recovered = recover_signer("Sign in to Writing Arena", &sig).unwrap();
        assert_eq!(recovered, address);
    }

    #[tokio::test]
    async fn test_verify_is_case_insensitive() {
        let (address, sig) = signed_triple("hello").await;
        assert!(verify_signature("hello", &sig, &address.to_uppercase().replace("0X", "0x")));
    }

    #[tokio::test]
    async fn test_tampered_message_fails() {
        let (address, sig) = signed_triple("hello").await;
        assert!(!verify_signature("hello!", &sig, &address));
    }

    #[tokio::test]
    async fn test_mismatched_address_fails() {
        let (_, sig) = signed_triple("hello").await;
        assert!(!verify_signature(
            "hello",
            &sig,
            "0x0000000000000000000000000000000000000001"
        ));
    }

    #[test]
    fn test_garbage_signature_fails() {
        assert!(!verify_signature(
            "hello",
            "not-a-signature",
            "0x0000000000000000000000000000000000000001"
        ));
    }

    #[test]
    fn test_token_round_trip() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue("0xABCD000000000000000000000000000000000001").unwrap();
        let claims = tokens.verify(&token).unwrap();
        // 발급 시 lowercase로 정규화됨
        assert_eq!(claims.wallet_address, "0xabcd000000000000000000000000000000000001");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_fails() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue("0xabcd000000000000000000000000000000000001").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(tokens.verify(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let tokens = TokenService::new("test-secret");
        let other = TokenService::new("other-secret");
        let token = tokens.issue("0xabcd000000000000000000000000000000000001").unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_fails() {
        let tokens = TokenService::new("test-secret");
        // 이미 만료된 claims를 직접 인코딩
        let claims = Claims {
            wallet_address: "0xabcd000000000000000000000000000000000001".to_string(),
            iat: Utc::now().timestamp() - 864_000,
            exp: Utc::now().timestamp() - 100,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(tokens.verify(&token).is_err());
    }
}
